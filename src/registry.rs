//! Provider registry: the static catalog of supported LLM APIs.
//!
//! Entries are created once at construction and never mutated. Lookup is
//! by id or by display name; `list()` preserves catalog insertion order
//! so UIs can render a stable menu.

use serde::{Deserialize, Serialize};

/// Provider id used when nothing has ever been configured.
pub const DEFAULT_PROVIDER_ID: &str = "gemini";

/// Wire-format family a provider speaks.
///
/// The client factory dispatches on this tag; several catalog entries can
/// share one family (OpenAI, Perplexity, and OpenRouter are all
/// OpenAI-compatible).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    OpenAiCompatible,
    Gemini,
    Cohere,
    HuggingFace,
    Ollama,
}

/// Static description of one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    pub requires_api_key: bool,
    pub default_model: String,
    pub description: String,
    pub supported_features: Vec<String>,
    pub family: ProviderFamily,
}

fn config(
    id: &str,
    display_name: &str,
    base_url: &str,
    requires_api_key: bool,
    default_model: &str,
    description: &str,
    supported_features: &[&str],
    family: ProviderFamily,
) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        display_name: display_name.to_string(),
        base_url: base_url.to_string(),
        requires_api_key,
        default_model: default_model.to_string(),
        description: description.to_string(),
        supported_features: supported_features.iter().map(|f| f.to_string()).collect(),
        family,
    }
}

/// Catalog of supported providers.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: Vec<ProviderConfig>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Build the catalog.
    pub fn new() -> Self {
        let entries = vec![
            config(
                "openai",
                "OpenAI",
                "https://api.openai.com/v1/chat/completions",
                true,
                "gpt-4o",
                "OpenAI GPT models",
                &["chat", "completion", "streaming"],
                ProviderFamily::OpenAiCompatible,
            ),
            config(
                "gemini",
                "Google Gemini (free)",
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent",
                true,
                "gemini-2.0-flash-exp",
                "Google's Gemini AI model - Free tier available",
                &["chat", "completion", "safety_settings"],
                ProviderFamily::Gemini,
            ),
            config(
                "cohere",
                "Cohere (free)",
                "https://api.cohere.ai/v1/generate",
                true,
                "command-r",
                "Cohere language models - Free tier available",
                &["completion", "embeddings"],
                ProviderFamily::Cohere,
            ),
            config(
                "huggingface",
                "Hugging Face (community)",
                "https://api-inference.huggingface.co/models/microsoft/DialoGPT-large",
                false,
                "microsoft/DialoGPT-large",
                "Hugging Face Inference API - Community models",
                &["completion", "inference"],
                ProviderFamily::HuggingFace,
            ),
            config(
                "perplexity",
                "Perplexity",
                "https://api.perplexity.ai/chat/completions",
                true,
                "sonar",
                "Perplexity search-enabled AI",
                &["chat", "search", "real_time"],
                ProviderFamily::OpenAiCompatible,
            ),
            config(
                "openrouter",
                "OpenRouter (free/credits)",
                "https://openrouter.ai/api/v1/chat/completions",
                true,
                "meta-llama/llama-3.1-8b-instruct:free",
                "OpenRouter model aggregator - Some free models",
                &["chat", "completion", "multiple_models"],
                ProviderFamily::OpenAiCompatible,
            ),
            config(
                "ollama",
                "On-Device (local)",
                "http://127.0.0.1:11434/api/generate",
                false,
                "llama3.2",
                "Local Ollama instance - Privacy focused",
                &["local", "offline", "privacy"],
                ProviderFamily::Ollama,
            ),
            config(
                "custom",
                "Custom",
                "",
                true,
                "",
                "Custom API endpoint",
                &["custom"],
                ProviderFamily::OpenAiCompatible,
            ),
        ];
        Self { entries }
    }

    /// Get a provider config by id.
    pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// All provider configs, in stable catalog order.
    pub fn list(&self) -> &[ProviderConfig] {
        &self.entries
    }

    /// Find a provider id by its display name.
    pub fn find_id_by_display_name(&self, display_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|c| c.display_name == display_name)
            .map(|c| c.id.as_str())
    }
}
