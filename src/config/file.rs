//! TOML configuration file loading
//!
//! Supports `~/.config/reverie/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ReverieConfigFile {
    /// Model configuration
    #[serde(default)]
    pub models: ModelsFileConfig,

    /// Voice configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,
}

/// Model identifiers
#[derive(Debug, Default, Deserialize)]
pub struct ModelsFileConfig {
    /// Text-generation model (e.g. "gemini-2.5-flash")
    pub text: Option<String>,

    /// TTS model (e.g. "gemini-2.5-flash-preview-tts")
    pub tts: Option<String>,
}

/// Voice configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Default voice name (e.g. "Kore")
    pub voice: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ReverieConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
pub fn load_config_file() -> ReverieConfigFile {
    let Some(path) = config_file_path() else {
        return ReverieConfigFile::default();
    };

    if !path.exists() {
        return ReverieConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ReverieConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ReverieConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/reverie/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("reverie").join("config.toml"))
}
