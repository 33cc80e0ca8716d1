//! HTTP transport with bounded timeouts and a normalized response envelope.
//!
//! Every call returns an [`HttpEnvelope`]: transport failures are folded
//! into the envelope with negative sentinel status codes instead of being
//! raised, so callers can always distinguish "never got a response" from
//! "got an error response". One attempt per call; retry policy belongs to
//! callers and is out of scope here.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::warn;

/// Sentinel status: I/O failure or timeout, no HTTP response received.
pub const STATUS_IO_FAILURE: i32 = -1;

/// Sentinel status: unexpected failure (bad URL, unserializable body).
pub const STATUS_UNEXPECTED_FAILURE: i32 = -2;

/// Default connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default overall call timeout in seconds (connect + write + read).
const CALL_TIMEOUT_SECS: u64 = 60;

/// Normalized transport outcome: status plus raw body text.
///
/// `status` is a real HTTP code for any response that arrived, or one of
/// the negative sentinels when no response was received at all.
#[derive(Debug, Clone)]
pub struct HttpEnvelope {
    pub successful: bool,
    pub status: i32,
    pub body: String,
}

impl HttpEnvelope {
    fn io_failure(message: String) -> Self {
        Self {
            successful: false,
            status: STATUS_IO_FAILURE,
            body: format!("Network error: {message}"),
        }
    }

    fn unexpected_failure(message: String) -> Self {
        Self {
            successful: false,
            status: STATUS_UNEXPECTED_FAILURE,
            body: format!("Unknown error: {message}"),
        }
    }

    /// True when the status is a transport sentinel rather than an HTTP code.
    pub fn is_transport_failure(&self) -> bool {
        self.status < 0
    }
}

/// Shared HTTP executor for provider calls.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Create a transport with the default timeouts.
    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(CALL_TIMEOUT_SECS),
        )
    }

    /// Create a transport with explicit connect and overall call timeouts.
    pub fn with_timeouts(connect: Duration, call: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect)
            .timeout(call)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// Execute a JSON POST request.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, String)],
    ) -> HttpEnvelope {
        let payload = match serde_json::to_string(body) {
            Ok(payload) => payload,
            Err(e) => return HttpEnvelope::unexpected_failure(e.to_string()),
        };

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        self.execute(request).await
    }

    /// Execute a GET request.
    pub async fn get(&self, url: &str, headers: &[(&str, String)]) -> HttpEnvelope {
        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        self.execute(request).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> HttpEnvelope {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                warn!(error = %e, "request could not be constructed");
                return HttpEnvelope::unexpected_failure(e.to_string());
            }
            Err(e) => {
                warn!(error = %e, "transport failure");
                return HttpEnvelope::io_failure(e.to_string());
            }
        };

        let status = response.status();
        // A failed body read after headers arrived still means no usable
        // response; report it as an I/O failure.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return HttpEnvelope::io_failure(e.to_string()),
        };

        HttpEnvelope {
            successful: status.is_success(),
            status: i32::from(status.as_u16()),
            body,
        }
    }
}
