//! Speech synthesis via the Gemini TTS API
//!
//! One request per utterance: text in, base64-encoded 16-bit PCM out
//! (24 kHz mono). No retry — a failed request is reported and the caller
//! must re-invoke explicitly.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Gemini API base URL
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The fixed set of prebuilt voices offered to the user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Voice {
    /// Firm, grounded
    #[default]
    Kore,
    /// Upbeat
    Puck,
    /// Bright
    Zephyr,
    /// Informative, low
    Charon,
    /// Excitable
    Fenrir,
    /// Breezy
    Aoede,
}

impl Voice {
    /// All available voices, in display order
    pub const ALL: [Self; 6] = [
        Self::Kore,
        Self::Puck,
        Self::Zephyr,
        Self::Charon,
        Self::Fenrir,
        Self::Aoede,
    ];

    /// The voice name as the API expects it
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kore => "Kore",
            Self::Puck => "Puck",
            Self::Zephyr => "Zephyr",
            Self::Charon => "Charon",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
        }
    }
}

impl std::str::FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("unknown voice: {s}")))
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can turn text into a base64 audio payload
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice`, returning base64-encoded PCM
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] on transport failure or when the
    /// response carries no audio.
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<String>;
}

/// Gemini TTS client
pub struct GeminiSpeech {
    client: Client,
    api_key: SecretString,
    model: String,
}

impl GeminiSpeech {
    /// Create a new TTS client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("Gemini API key required for TTS".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSpeech {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<String> {
        let request = SpeechRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            }],
            generation_config: SpeechGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.as_str().to_string(),
                        },
                    },
                },
            },
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("Gemini TTS error {status}: {body}")));
        }

        let result: SpeechResponse = response
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("failed to parse response: {e}")))?;

        let payload = extract_audio(result)
            .ok_or_else(|| Error::Synthesis("response contained no audio".to_string()))?;

        tracing::debug!(voice = %voice, bytes = payload.len(), "speech synthesized");
        Ok(payload)
    }
}

/// Pull the first inline audio payload out of a response, if any
fn extract_audio(response: SpeechResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.inline_data)
        .map(|data| data.data)
        .filter(|payload| !payload.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest {
    contents: Vec<Content>,
    generation_config: SpeechGenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechGenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
struct SpeechResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    data: String,
}
