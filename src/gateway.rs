//! Gateway service: orchestrates store, registry, clients, and transport.
//!
//! The gateway owns no state of its own: it resolves the active provider
//! from the credential store, fails fast on missing configuration before
//! any network traffic, applies per-call overrides, composes the
//! canonical prompt, and delegates to the matching client variant. It
//! never raises: every path ends in a [`GenerationOutcome`].

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::instrument;

use crate::providers;
use crate::registry::ProviderConfig;
use crate::store::{CredentialStore, ProviderCredential};
use crate::telemetry;
use crate::transport::HttpTransport;
use crate::types::{ErrorKind, GenerationOutcome};

/// Provider gateway for prompt refinement.
pub struct PromptGateway {
    store: Arc<CredentialStore>,
    transport: HttpTransport,
}

impl PromptGateway {
    /// Create a gateway with the default transport timeouts.
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self::with_transport(store, HttpTransport::new())
    }

    /// Create a gateway with an explicit transport (testing, custom timeouts).
    pub fn with_transport(store: Arc<CredentialStore>, transport: HttpTransport) -> Self {
        Self { store, transport }
    }

    /// Refine a user brief into a reusable prompt via the active provider.
    #[instrument(name = "gateway.generate", skip_all, fields(theme = %theme))]
    pub async fn generate_refined_prompt(&self, user_input: &str, theme: &str) -> GenerationOutcome {
        let (config, credential) = self.store.active_provider_or_default();
        let api_key = credential
            .as_ref()
            .map(|c| c.api_key.clone())
            .unwrap_or_default();

        // Fail fast before any network call.
        if config.requires_api_key && api_key.trim().is_empty() {
            return self.record(
                &config.id,
                GenerationOutcome::failure(
                    ErrorKind::Configuration,
                    format!(
                        "No API key configured for {}. Open Settings to add one.",
                        config.display_name
                    ),
                ),
            );
        }

        let effective = apply_overrides(&config, credential.as_ref());
        if effective.base_url.trim().is_empty() {
            return self.record(
                &config.id,
                GenerationOutcome::failure(
                    ErrorKind::Configuration,
                    format!(
                        "No endpoint configured for {}. Open Settings.",
                        config.display_name
                    ),
                ),
            );
        }

        let prompt = compose_prompt(user_input, theme);
        let provider_id = effective.id.clone();
        let client = providers::client_for(effective, self.transport.clone());

        let start = Instant::now();
        let outcome = client.generate(&prompt, &api_key).await;
        histogram!(
            telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider_id.clone()
        )
        .record(start.elapsed().as_secs_f64());

        if let Some(usage) = &outcome.usage {
            counter!(
                telemetry::TOKENS_TOTAL,
                "provider" => provider_id.clone(),
                "direction" => "prompt"
            )
            .increment(u64::from(usage.prompt_tokens));
            counter!(
                telemetry::TOKENS_TOTAL,
                "provider" => provider_id.clone(),
                "direction" => "completion"
            )
            .increment(u64::from(usage.completion_tokens));
        }

        self.record(&provider_id, outcome)
    }

    /// The provider currently serving generation requests.
    pub fn active_provider(&self) -> ProviderConfig {
        self.store.active_provider_or_default().0
    }

    /// Whether the active provider has everything it needs to be called.
    pub fn is_active_provider_configured(&self) -> bool {
        self.store.is_configured(&self.store.active_provider_id())
    }

    fn record(&self, provider_id: &str, outcome: GenerationOutcome) -> GenerationOutcome {
        let status = if outcome.is_successful() { "ok" } else { "error" };
        counter!(
            telemetry::REQUESTS_TOTAL,
            "provider" => provider_id.to_string(),
            "status" => status
        )
        .increment(1);
        outcome
    }
}

/// Compose the canonical prompt sent to every provider.
fn compose_prompt(user_input: &str, theme: &str) -> String {
    format!("Theme: {theme}\nUser: {user_input}\nDeliver: A single prompt (no sample answer).")
}

/// Apply credential overrides to a per-call copy of the registry config.
///
/// The registry itself is never mutated; blank overrides are ignored.
fn apply_overrides(config: &ProviderConfig, credential: Option<&ProviderCredential>) -> ProviderConfig {
    let mut effective = config.clone();
    if let Some(credential) = credential {
        if !credential.custom_endpoint.trim().is_empty() {
            effective.base_url = credential.custom_endpoint.clone();
        }
        if !credential.custom_model.trim().is_empty() {
            effective.default_model = credential.custom_model.clone();
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderRegistry;

    #[test]
    fn canonical_prompt_embeds_theme_and_input() {
        let prompt = compose_prompt("write a poem", "story");
        assert_eq!(
            prompt,
            "Theme: story\nUser: write a poem\nDeliver: A single prompt (no sample answer)."
        );
    }

    #[test]
    fn overrides_replace_endpoint_and_model() {
        let registry = ProviderRegistry::new();
        let config = registry.get("openai").unwrap();
        let credential = ProviderCredential {
            provider_id: "openai".into(),
            custom_endpoint: "https://proxy.test/v1/chat/completions".into(),
            custom_model: "gpt-4o-mini".into(),
            ..Default::default()
        };

        let effective = apply_overrides(config, Some(&credential));
        assert_eq!(effective.base_url, "https://proxy.test/v1/chat/completions");
        assert_eq!(effective.default_model, "gpt-4o-mini");
        // Registry entry untouched.
        assert_eq!(registry.get("openai").unwrap().default_model, "gpt-4o");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let registry = ProviderRegistry::new();
        let config = registry.get("gemini").unwrap();
        let credential = ProviderCredential {
            provider_id: "gemini".into(),
            custom_endpoint: "   ".into(),
            ..Default::default()
        };

        let effective = apply_overrides(config, Some(&credential));
        assert_eq!(effective.base_url, config.base_url);
        assert_eq!(effective.default_model, config.default_model);
    }

    #[test]
    fn missing_credential_keeps_registry_defaults() {
        let registry = ProviderRegistry::new();
        let config = registry.get("ollama").unwrap();
        let effective = apply_overrides(config, None);
        assert_eq!(&effective, config);
    }
}
