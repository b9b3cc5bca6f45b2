//! Reverie - spoken metaphorical reflections
//!
//! Core functionality for the `reverie` CLI:
//! - Reflection generation (Gemini text API with a fixed persona)
//! - Speech synthesis (Gemini TTS, base64 16-bit PCM at 24 kHz)
//! - PCM decoding and single-flight audio playback
//! - The interactive terminal session tying them together
//!
//! ```text
//! user text ──► reflection client ──► reflection
//!                                        │ /speak
//!                                        ▼
//!               speech client ──► base64 PCM ──► decode ──► speaker
//! ```

pub mod config;
pub mod error;
pub mod persona;
pub mod reflection;
pub mod session;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use reflection::{GeminiReflection, ReflectionSource};
pub use session::Session;
pub use voice::{GeminiSpeech, PlayOutcome, Speaker, SpeakerState, Voice};
