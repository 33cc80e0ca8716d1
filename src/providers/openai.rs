//! OpenAI-compatible chat completions client.
//!
//! Serves the `openai`, `perplexity`, `openrouter`, and `custom` catalog
//! entries, which all speak the `/chat/completions` message-array format.
//! This is the only variant that surfaces token usage counters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::ProviderClient;
use super::{SYSTEM_INSTRUCTION, bearer_headers, failure_from_envelope};
use crate::registry::ProviderConfig;
use crate::transport::HttpTransport;
use crate::types::{ErrorKind, GenerationOutcome, TokenUsage};

/// Client for OpenAI-compatible chat APIs.
pub struct OpenAiClient {
    config: ProviderConfig,
    transport: HttpTransport,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig, transport: HttpTransport) -> Self {
        Self { config, transport }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.default_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 1.0,
        }
    }

    fn parse_success(&self, body: &str) -> GenerationOutcome {
        let parsed: ChatResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return GenerationOutcome::failure(
                    ErrorKind::ResponseParse,
                    format!("Failed to parse {} response: {e}", self.config.display_name),
                );
            }
        };

        let Some(choice) = parsed.choices.into_iter().next() else {
            return GenerationOutcome::failure(
                ErrorKind::ResponseParse,
                format!("Empty response from {}", self.config.display_name),
            );
        };

        let text = choice.message.content.trim().to_string();
        match parsed.usage {
            Some(usage) => GenerationOutcome::success_with_usage(
                text,
                TokenUsage {
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                },
            ),
            None => GenerationOutcome::success(text),
        }
    }

    fn parse_error(&self, body: &str, code: i32) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error: Some(error) }) => {
                let message = error.message.unwrap_or_else(|| "Unknown error".to_string());
                let kind = error.kind.unwrap_or_default();
                format!("API Error ({code}): {kind} - {message}")
            }
            Ok(ErrorEnvelope { error: None }) => format!("HTTP Error: {code}"),
            Err(_) => format!("HTTP Error: {code} - {body}"),
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.config.id
    }

    #[instrument(name = "openai.generate", skip_all, fields(provider = %self.config.id, model = %self.config.default_model))]
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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_config;

    fn client() -> OpenAiClient {
        OpenAiClient::new(test_config("openai"), HttpTransport::new())
    }

    #[test]
    fn parses_choices_and_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "  A refined prompt.  "}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46}
        }"#;
        let outcome = client().parse_success(body);
        assert!(outcome.is_successful());
        assert_eq!(outcome.text, "A refined prompt.");
        let usage = outcome.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.total_tokens, 46);
    }

    #[test]
    fn usage_is_optional() {
        let body = r#"{"choices": [{"message": {"content": "text"}}]}"#;
        let outcome = client().parse_success(body);
        assert!(outcome.is_successful());
        assert!(outcome.usage.is_none());
    }

    #[test]
    fn empty_choices_is_a_failure_not_a_panic() {
        let outcome = client().parse_success(r#"{"choices": []}"#);
        assert!(!outcome.is_successful());
        assert_eq!(outcome.error_message(), Some("Empty response from OpenAI"));
        assert_eq!(
            outcome.error.unwrap().kind,
            ErrorKind::ResponseParse
        );
    }

    #[test]
    fn malformed_json_is_a_parse_failure() {
        let outcome = client().parse_success("not json");
        assert!(!outcome.is_successful());
        assert!(outcome.error_message().unwrap().contains("Failed to parse"));
    }

    #[test]
    fn structured_error_includes_code_and_message() {
        let message = client().parse_error(
            r#"{"error": {"message": "rate limited", "type": "rate_limit_error"}}"#,
            429,
        );
        assert!(message.contains("429"));
        assert!(message.contains("rate limited"));
        assert!(message.contains("rate_limit_error"));
    }

    #[test]
    fn unstructured_error_embeds_raw_body() {
        let message = client().parse_error("<html>bad gateway</html>", 502);
        assert!(message.contains("502"));
        assert!(message.contains("bad gateway"));
    }
}
