//! HTTP provider for the Gemini `generateContent` endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CommentaryProvider, CommentaryRequest};
use crate::error::CommentaryError;
use crate::settings::CommentarySettings;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Commentary from a Gemini model
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
    temperature: f32,
}

impl GeminiProvider {
    /// Build from settings, reading the key from the configured env variable
    pub fn from_settings(settings: &CommentarySettings) -> Result<Self, CommentaryError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CommentaryError::MissingKey(settings.api_key_env.clone()))?;
        Ok(Self::new(settings, api_key))
    }

    pub fn new(settings: &CommentarySettings, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key.into(),
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl CommentaryProvider for GeminiProvider {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        let prompt = request.prompt();
        let body = GenerateRequest {
            contents: [Content {
                parts: [TextPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CommentaryError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CommentaryError::Status(response.status().as_u16()));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CommentaryError::network(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.text())
    }
}
