//! Provider client implementations, one per wire-format family.

mod cohere;
mod gemini;
mod huggingface;
mod ollama;
mod openai;
mod traits;

pub use cohere::CohereClient;
pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use traits::ProviderClient;

use tracing::warn;

use crate::registry::{ProviderConfig, ProviderFamily};
use crate::transport::{HttpEnvelope, HttpTransport};
use crate::types::{ErrorKind, GenerationOutcome};

/// Fixed instruction injected ahead of every user brief.
///
/// Variants with a role-based schema send it as a system message; the
/// rest concatenate it in front of the prompt text.
pub const SYSTEM_INSTRUCTION: &str = "You are a prompt engineer. Given the user's brief, \
     create a concise, detailed prompt that the user can paste into an LLM. \
     DO NOT answer the user's request — output only the prompt text.";

/// Build the client variant for a provider config.
///
/// The config passed here is the per-call effective config: credential
/// overrides (endpoint, model) have already been applied by the gateway.
pub fn client_for(config: ProviderConfig, transport: HttpTransport) -> Box<dyn ProviderClient> {
    match config.family {
        ProviderFamily::OpenAiCompatible => Box::new(OpenAiClient::new(config, transport)),
        ProviderFamily::Gemini => Box::new(GeminiClient::new(config, transport)),
        ProviderFamily::Cohere => Box::new(CohereClient::new(config, transport)),
        ProviderFamily::HuggingFace => Box::new(HuggingFaceClient::new(config, transport)),
        ProviderFamily::Ollama => Box::new(OllamaClient::new(config, transport)),
    }
}

/// Bearer-token headers for providers that authenticate in the header.
pub(crate) fn bearer_headers(api_key: &str) -> Vec<(&'static str, String)> {
    if api_key.is_empty() {
        Vec::new()
    } else {
        vec![("Authorization", format!("Bearer {api_key}"))]
    }
}

/// Convert a failed envelope plus a parsed error message into an outcome.
///
/// Transport sentinels (no response at all) and HTTP error responses map
/// to distinct failure kinds so callers can tell them apart.
pub(crate) fn failure_from_envelope(
    provider: &str,
    envelope: &HttpEnvelope,
    message: String,
) -> GenerationOutcome {
    warn!(provider, status = envelope.status, "API call failed: {message}");
    let kind = if envelope.is_transport_failure() {
        ErrorKind::Transport
    } else {
        ErrorKind::HttpStatus
    };
    GenerationOutcome::failure(kind, message)
}

#[cfg(test)]
pub(crate) fn test_config(id: &str) -> ProviderConfig {
    crate::registry::ProviderRegistry::new()
        .get(id)
        .expect("test provider id")
        .clone()
}
