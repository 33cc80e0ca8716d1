//! Google Gemini generateContent client.
//!
//! Authenticates via a `key` query-string parameter rather than a header.
//! The schema has no system role here, so the instruction is concatenated
//! into the single text part.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::ProviderClient;
use super::{SYSTEM_INSTRUCTION, failure_from_envelope};
use crate::registry::ProviderConfig;
use crate::transport::HttpTransport;
use crate::types::{ErrorKind, GenerationOutcome};

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    config: ProviderConfig,
    transport: HttpTransport,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig, transport: HttpTransport) -> Self {
        Self { config, transport }
    }

    fn request_body(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{SYSTEM_INSTRUCTION}\n\n{prompt}"),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 1.0,
                max_output_tokens: 1000,
                candidate_count: 1,
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }

    fn parse_success(&self, body: &str) -> GenerationOutcome {
        let parsed: GenerateContentResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return GenerationOutcome::failure(
                    ErrorKind::ResponseParse,
                    format!("Failed to parse Gemini response: {e}"),
                );
            }
        };

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string());

        match text {
            Some(text) if !text.is_empty() => GenerationOutcome::success(text),
            _ => GenerationOutcome::failure(
                ErrorKind::ResponseParse,
                format!("Empty response from {}", self.config.display_name),
            ),
        }
    }

    fn parse_error(&self, body: &str, code: i32) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error: Some(error) }) => {
                let message = error
                    .message
                    .unwrap_or_else(|| "Unknown Gemini error".to_string());
                let status = error.status.unwrap_or_default();
                format!("Gemini Error ({code}): {status} - {message}")
            }
            Ok(ErrorEnvelope { error: None }) => format!("Gemini HTTP Error: {code}"),
            Err(_) => format!("Gemini HTTP Error: {code} - {body}"),
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn name(&self) -> &str {
        &self.config.id
    }

    #[instrument(name = "gemini.generate", skip_all, fields(provider = %self.config.id, model = %self.config.default_model))]
    async fn generate(&self, prompt: &str, api_key: &str) -> GenerationOutcome {
        // Gemini carries the key in the query string, not a header.
        let url = format!("{}?key={api_key}", self.config.base_url);
        let body = self.request_body(prompt);
        let envelope = self.transport.post(&url, &body, &[]).await;

        if envelope.successful {
            self.parse_success(&envelope.body)
        } else {
            let message = self.parse_error(&envelope.body, envelope.status);
            failure_from_envelope(&self.config.id, &envelope, message)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
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
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
