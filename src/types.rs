//! Canonical outcome types shared by all provider clients.

use serde::{Deserialize, Serialize};

/// Outcome of one generation attempt, normalized across providers.
///
/// The gateway never raises past its boundary: configuration problems,
/// transport failures, HTTP error responses, and malformed payloads all
/// surface here as a [`GenerationFailure`] instead of an `Err`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Generated text. Empty when the request failed.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GenerationFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl GenerationOutcome {
    /// Successful outcome carrying generated text.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
            usage: None,
        }
    }

    /// Successful outcome with token accounting attached.
    pub fn success_with_usage(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            error: None,
            usage: Some(usage),
        }
    }

    /// Failed outcome with a structured kind and a human-readable message.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            error: Some(GenerationFailure {
                kind,
                message: message.into(),
            }),
            usage: None,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }

    /// The failure message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Structured description of a failed generation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Failure taxonomy for generation attempts.
///
/// Callers should branch on this instead of matching message substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing endpoint or required API key; detected before any network call.
    Configuration,
    /// I/O failure or timeout; no HTTP response was received.
    Transport,
    /// Non-2xx HTTP response; the status code is preserved in the message.
    HttpStatus,
    /// The provider returned a payload the client could not interpret.
    ResponseParse,
}

/// Token usage statistics
///
/// Only surfaced by OpenAI-compatible providers; others omit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
