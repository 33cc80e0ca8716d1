//! Promptforge - provider gateway for prompt refinement
//!
//! This crate turns a rough user brief into a refined, reusable LLM prompt
//! by routing a single request through one of several interchangeable
//! provider HTTP APIs (OpenAI-compatible, Gemini, Cohere, HuggingFace,
//! Ollama) and normalizing their heterogeneous responses into one
//! [`GenerationOutcome`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use promptforge::store::{CredentialStore, MemoryStore, ProviderCredential};
//! use promptforge::PromptGateway;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> promptforge::Result<()> {
//!     let store = CredentialStore::open(Box::new(MemoryStore::new()))?;
//!     store.save_credential(ProviderCredential {
//!         provider_id: "gemini".into(),
//!         api_key: "your-key".into(),
//!         is_active: true,
//!         ..Default::default()
//!     })?;
//!
//!     let gateway = PromptGateway::new(Arc::new(store));
//!     let outcome = gateway
//!         .generate_refined_prompt("a landing page for a bakery", "marketing")
//!         .await;
//!
//!     if outcome.is_successful() {
//!         println!("{}", outcome.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod providers;
pub mod registry;
pub mod store;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use error::{PromptforgeError, Result};
pub use gateway::PromptGateway;
pub use registry::{ProviderConfig, ProviderFamily, ProviderRegistry, DEFAULT_PROVIDER_ID};
pub use transport::{HttpEnvelope, HttpTransport};
pub use types::{ErrorKind, GenerationFailure, GenerationOutcome, TokenUsage};
