//! Cohere generate client.
//!
//! Flat prompt string with generation parameters; bearer auth. Older API
//! versions returned the text at the top level instead of inside
//! `generations`, so both shapes are accepted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::ProviderClient;
use super::{SYSTEM_INSTRUCTION, bearer_headers, failure_from_envelope};
use crate::registry::ProviderConfig;
use crate::transport::HttpTransport;
use crate::types::{ErrorKind, GenerationOutcome};

/// Client for the Cohere generate API.
pub struct CohereClient {
    config: ProviderConfig,
    transport: HttpTransport,
}

impl CohereClient {
    pub fn new(config: ProviderConfig, transport: HttpTransport) -> Self {
        Self { config, transport }
    }

    fn request_body<'a>(&'a self, prompt: &str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.default_model,
            prompt: format!("{SYSTEM_INSTRUCTION}\n\n{prompt}"),
            max_tokens: 1000,
            temperature: 0.7,
            k: 0,
            p: 0.75,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop_sequences: Vec::new(),
            return_likelihoods: "NONE",
        }
    }

    fn parse_success(&self, body: &str) -> GenerationOutcome {
        let parsed: GenerateResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return GenerationOutcome::failure(
                    ErrorKind::ResponseParse,
                    format!("Failed to parse Cohere response: {e}"),
                );
            }
        };

        let text = parsed
            .generations
            .and_then(|generations| generations.into_iter().next().map(|g| g.text))
            .or(parsed.text)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            GenerationOutcome::failure(
                ErrorKind::ResponseParse,
                format!("Empty response from {}", self.config.display_name),
            )
        } else {
            GenerationOutcome::success(text)
        }
    }

    fn parse_error(&self, body: &str, code: i32) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(error) => {
                let message = error
                    .message
                    .unwrap_or_else(|| "Unknown Cohere error".to_string());
                format!("Cohere Error ({code}): {message}")
            }
            Err(_) => format!("Cohere HTTP Error: {code} - {body}"),
        }
    }
}

#[async_trait]
impl ProviderClient for CohereClient {
    fn name(&self) -> &str {
        &self.config.id
    }

    #[instrument(name = "cohere.generate", skip_all, fields(provider = %self.config.id, model = %self.config.default_model))]
    async fn generate(&self, prompt: &str, api_key: &str) -> GenerationOutcome {
        let body = self.request_body(prompt);
        let headers = bearer_headers(api_key);
        let envelope = self
            .transport
            .post(&self.config.base_url, &body, &headers)
            .await;

        if envelope.successful {
            self.parse_success(&envelope.body)
        } else {
            let message = self.parse_error(&envelope.body, envelope.status);
            failure_from_envelope(&self.config.id, &envelope, message)
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    k: u32,
    p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stop_sequences: Vec<String>,
    return_likelihoods: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    generations: Option<Vec<Generation>>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Generation {
    text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_config;

    fn client() -> CohereClient {
        CohereClient::new(test_config("cohere"), HttpTransport::new())
    }

    #[test]
    fn parses_generations_array() {
        let body = r#"{"id": "x", "generations": [{"id": "y", "text": " A refined prompt. "}]}"#;
        let outcome = client().parse_success(body);
        assert!(outcome.is_successful());
        assert_eq!(outcome.text, "A refined prompt.");
    }

    #[test]
    fn falls_back_to_top_level_text() {
        let outcome = client().parse_success(r#"{"text": "legacy shape"}"#);
        assert!(outcome.is_successful());
        assert_eq!(outcome.text, "legacy shape");
    }

    #[test]
    fn empty_generations_is_a_failure() {
        let outcome = client().parse_success(r#"{"generations": []}"#);
        assert!(!outcome.is_successful());
        assert_eq!(
            outcome.error_message(),
            Some("Empty response from Cohere (free)")
        );
    }

    #[test]
    fn error_message_field() {
        let message = client().parse_error(r#"{"message": "invalid api token"}"#, 401);
        assert!(message.contains("401"));
        assert!(message.contains("invalid api token"));
    }

    #[test]
    fn raw_body_on_unparseable_error() {
        let message = client().parse_error("gateway timeout", 504);
        assert!(message.contains("504"));
        assert!(message.contains("gateway timeout"));
    }
}
