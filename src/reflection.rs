//! Reflection generation via the Gemini text API
//!
//! A single request/response call: the user's text goes out with the fixed
//! persona instruction, a short metaphorical reflection comes back. No
//! retry, no caching — the caller resubmits explicitly on failure.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::persona::{PERSONA_INSTRUCTION, TEMPERATURE, TOP_P};
use crate::{Error, Result};

/// Gemini API base URL
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Something that can produce a reflection for user text
#[async_trait]
pub trait ReflectionSource: Send + Sync {
    /// Generate a reflection for `user_text`
    ///
    /// `user_text` must be non-empty after trimming; the session boundary
    /// validates this before calling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] on transport failure or an empty
    /// response.
    async fn reflect(&self, user_text: &str) -> Result<String>;
}

/// Gemini text-generation client with the fixed reflection persona
pub struct GeminiReflection {
    client: Client,
    api_key: SecretString,
    model: String,
}

impl GeminiReflection {
    /// Create a new reflection client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "Gemini API key required for reflections".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl ReflectionSource for GeminiReflection {
    async fn reflect(&self, user_text: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: user_text.to_string(),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: PERSONA_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
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
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("Gemini error {status}: {body}")));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("failed to parse response: {e}")))?;

        let text = extract_text(result)
            .ok_or_else(|| Error::Generation("response contained no text".to_string()))?;

        tracing::debug!(chars = text.len(), "reflection generated");
        Ok(text)
    }
}

/// Pull the first non-empty text part out of a response, if any
fn extract_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
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
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
struct ResponsePart {
    text: Option<String>,
}
