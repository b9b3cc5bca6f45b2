//! Error types for Reverie

use thiserror::Error;

/// Result type alias for Reverie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Reverie
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Reflection generation failed (text request failed or errored)
    #[error("generation failed: {0}")]
    Generation(String),

    /// Speech synthesis failed (request errored, returned no audio,
    /// or the audio payload could not be decoded)
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Audio output error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
