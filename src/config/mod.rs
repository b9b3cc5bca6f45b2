//! Configuration management for Reverie
//!
//! Precedence, lowest to highest: built-in defaults, the optional TOML file,
//! environment variables, CLI flags (applied by the caller).

pub mod file;

use crate::voice::Voice;
use crate::{Error, Result};

/// Default text-generation model
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Default TTS model
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Reverie runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key (wrapped in `SecretString` at each client boundary)
    pub api_key: String,

    /// Text-generation model identifier
    pub text_model: String,

    /// TTS model identifier
    pub tts_model: String,

    /// Voice for synthesized speech
    pub voice: Voice,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// `voice_override` carries the CLI value (clap already folds the
    /// `REVERIE_VOICE` environment variable into it) and takes precedence
    /// over the config file.
    ///
    /// # Errors
    ///
    /// Returns error if `GEMINI_API_KEY` is unset or a voice name is
    /// unknown.
    pub fn load(voice_override: Option<&str>) -> Result<Self> {
        let file = file::load_config_file();

        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("GEMINI_API_KEY is not set (get a key at aistudio.google.com)".to_string())
            })?;

        let voice = resolve_voice(voice_override, file.voice.voice)?;

        Ok(Self {
            api_key,
            text_model: file
                .models
                .text
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            tts_model: file
                .models
                .tts
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            voice,
        })
    }
}

/// Pick the voice: override (CLI/env via clap) over file over default
fn resolve_voice(voice_override: Option<&str>, file_voice: Option<String>) -> Result<Voice> {
    match voice_override.or(file_voice.as_deref()) {
        Some(name) => name.parse(),
        None => Ok(Voice::default()),
    }
}
