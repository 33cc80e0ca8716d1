//! HuggingFace Inference API client.
//!
//! The serverless inference endpoint is loosely typed: it may answer with
//! an array of generations, a single object, or plain text. The auth
//! header is optional; community models work without a key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::ProviderClient;
use super::{SYSTEM_INSTRUCTION, bearer_headers, failure_from_envelope};
use crate::registry::ProviderConfig;
use crate::transport::HttpTransport;
use crate::types::{ErrorKind, GenerationOutcome};

/// Client for the HuggingFace Inference API.
pub struct HuggingFaceClient {
    config: ProviderConfig,
    transport: HttpTransport,
}

impl HuggingFaceClient {
    pub fn new(config: ProviderConfig, transport: HttpTransport) -> Self {
        Self { config, transport }
    }

    fn request_body(&self, prompt: &str) -> InferenceRequest {
        InferenceRequest {
            inputs: format!("{SYSTEM_INSTRUCTION}\n\nUser: {prompt}\nAssistant:"),
            parameters: InferenceParameters {
                max_new_tokens: 1000,
                temperature: 0.7,
                top_p: 0.95,
                do_sample: true,
                return_full_text: false,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        }
    }

    fn parse_success(&self, body: &str) -> GenerationOutcome {
        // Array shape, object shape, or (for some pipelines) raw text.
        let text = match serde_json::from_str::<InferenceResponse>(body) {
            Ok(InferenceResponse::Many(results)) => results
                .into_iter()
                .next()
                .and_then(|r| r.generated_text)
                .unwrap_or_default(),
            Ok(InferenceResponse::One(result)) => result.generated_text.unwrap_or_default(),
            Err(_) => body.to_string(),
        };

        let text = text.trim().to_string();
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
                    .error
                    .unwrap_or_else(|| "Unknown HuggingFace error".to_string());
                format!("HuggingFace Error ({code}): {message}")
            }
            Err(_) => format!("HuggingFace HTTP Error: {code} - {body}"),
        }
    }
}

#[async_trait]
impl ProviderClient for HuggingFaceClient {
    fn name(&self) -> &str {
        &self.config.id
    }

    #[instrument(name = "huggingface.generate", skip_all, fields(provider = %self.config.id, model = %self.config.default_model))]
    async fn generate(&self, prompt: &str, api_key: &str) -> GenerationOutcome {
        let body = self.request_body(prompt);
        // bearer_headers is already empty for a blank key.
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
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<Generated>),
    One(Generated),
}

#[derive(Deserialize)]
struct Generated {
    generated_text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}
