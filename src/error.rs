//! Promptforge error types

/// Promptforge error types
#[derive(Debug, thiserror::Error)]
pub enum PromptforgeError {
    // Persistence errors
    #[error("storage error: {0}")]
    Storage(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Lookup errors
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// Result type alias for Promptforge operations
pub type Result<T> = std::result::Result<T, PromptforgeError>;
