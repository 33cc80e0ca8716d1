//! Provider client trait.
//!
//! Each wire-format variant implements [`ProviderClient`] and is selected
//! through the family-keyed factory in [`super::client_for`]. A client
//! never propagates an unhandled failure: transport errors, HTTP error
//! responses, and malformed payloads all come back as a failed
//! [`GenerationOutcome`].

use async_trait::async_trait;

use crate::types::GenerationOutcome;

/// One provider wire-format variant: build request, execute, parse.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider id for logging/debugging.
    fn name(&self) -> &str;

    /// Run one generation round trip for the canonical prompt.
    ///
    /// `api_key` may be blank for providers that don't require one.
    async fn generate(&self, prompt: &str, api_key: &str) -> GenerationOutcome;
}
