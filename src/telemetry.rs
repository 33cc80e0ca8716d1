//! Telemetry metric name constants.
//!
//! Centralised metric names for promptforge operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `promptforge_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider id (e.g. "openai", "ollama")
//! - `status`: outcome, "ok" or "error"
//! - `direction`: token direction, "prompt" or "completion"

/// Total generation requests dispatched through the gateway.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "promptforge_requests_total";

/// Generation request duration in seconds.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "promptforge_request_duration_seconds";

/// Total tokens consumed, when the provider reports usage.
///
/// Labels: `provider`, `direction` ("prompt" | "completion").
pub const TOKENS_TOTAL: &str = "promptforge_tokens_total";
