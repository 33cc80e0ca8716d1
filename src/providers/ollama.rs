//! Ollama local generate client.
//!
//! Talks to a local Ollama daemon; no authentication. Streaming is
//! disabled explicitly so the whole response arrives in one body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::ProviderClient;
use super::{SYSTEM_INSTRUCTION, failure_from_envelope};
use crate::registry::ProviderConfig;
use crate::transport::HttpTransport;
use crate::types::{ErrorKind, GenerationOutcome};

/// Client for the Ollama /api/generate endpoint.
pub struct OllamaClient {
    config: ProviderConfig,
    transport: HttpTransport,
}

impl OllamaClient {
    pub fn new(config: ProviderConfig, transport: HttpTransport) -> Self {
        Self { config, transport }
    }

    fn request_body<'a>(&'a self, prompt: &str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.default_model,
            prompt: format!("{SYSTEM_INSTRUCTION}\n\n{prompt}"),
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                top_p: 0.9,
                num_predict: 1000,
            },
        }
    }

    fn parse_success(&self, body: &str) -> GenerationOutcome {
        let parsed: GenerateResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return GenerationOutcome::failure(
                    ErrorKind::ResponseParse,
                    format!("Failed to parse Ollama response: {e}"),
                );
            }
        };

        let text = parsed.response.unwrap_or_default().trim().to_string();
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
            Ok(ErrorBody { error: Some(error) }) => format!("Ollama Error ({code}): {error}"),
            _ => format!(
                "Ollama HTTP Error: {code} - Check if Ollama is running on localhost:11434"
            ),
        }
    }
}

#[async_trait]
impl ProviderClient for OllamaClient {
    fn name(&self) -> &str {
        &self.config.id
    }

    #[instrument(name = "ollama.generate", skip_all, fields(provider = %self.config.id, model = %self.config.default_model))]
    async fn generate(&self, prompt: &str, _api_key: &str) -> GenerationOutcome {
        let body = self.request_body(prompt);
        let envelope = self
            .transport
            .post(&self.config.base_url, &body, &[])
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
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_config;

    fn client() -> OllamaClient {
        OllamaClient::new(test_config("ollama"), HttpTransport::new())
    }

    #[test]
    fn parses_response_field() {
        let body = r#"{"model": "llama3.2", "response": " A refined prompt. ", "done": true}"#;
        let outcome = client().parse_success(body);
        assert!(outcome.is_successful());
        assert_eq!(outcome.text, "A refined prompt.");
    }

    #[test]
    fn blank_response_is_a_failure() {
        let outcome = client().parse_success(r#"{"response": ""}"#);
        assert!(!outcome.is_successful());
        assert_eq!(
            outcome.error_message(),
            Some("Empty response from On-Device (local)")
        );
    }

    #[test]
    fn error_field_extracted() {
        let message = client().parse_error(r#"{"error": "model 'nope' not found"}"#, 404);
        assert!(message.contains("404"));
        assert!(message.contains("model 'nope' not found"));
    }

    #[test]
    fn fallback_error_hints_at_local_daemon() {
        let message = client().parse_error("", 500);
        assert!(message.contains("Ollama is running"));
    }

    #[test]
    fn request_disables_streaming() {
        let client = client();
        let body = client.request_body("hello");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1000);
    }
}
