//! Voice pipeline
//!
//! PCM payload decoding, audio output, speech synthesis, and the playback
//! controller that ties them together.

pub mod pcm;
mod playback;
mod speaker;
mod tts;

pub use pcm::{TTS_CHANNELS, TTS_SAMPLE_RATE, samples_to_wav};
pub use playback::{AudioSink, CpalSink, PlaybackHandle};
pub use speaker::{PlayOutcome, Speaker, SpeakerState};
pub use tts::{GeminiSpeech, SpeechSynthesizer, Voice};
