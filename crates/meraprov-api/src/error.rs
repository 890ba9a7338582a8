use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `meraprov-api` crate.
///
/// Every failure mode of a single Dashboard API call: authentication,
/// transport, HTTP status, and body decoding. `meraprov-core` maps these
/// into per-step domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API key was rejected (HTTP 401) or lacks access to the
    /// organization (HTTP 403).
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    /// The API key could not be encoded as a header value.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// Rate limited by the Dashboard API (HTTP 429).
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The request was rejected (HTTP 4xx other than 401/403/429).
    /// `errors` is the service's `{"errors": [...]}` array, if any.
    #[error("Dashboard API rejected the request (HTTP {status}): {}", join_errors(.errors, .status))]
    Api { status: u16, errors: Vec<String> },

    /// The service failed (HTTP 5xx).
    #[error("Dashboard API service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn join_errors(errors: &[String], status: &u16) -> String {
    if errors.is_empty() {
        reqwest::StatusCode::from_u16(*status)
            .map(|s| s.to_string())
            .unwrap_or_else(|_| status.to_string())
    } else {
        errors.join("; ")
    }
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Connectivity failures, timeouts, rate limiting and 5xx responses are
    /// transient. Anything the caller sent wrong is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Service { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the resource addressed by the request does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// The HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Api { status, .. }
            | Self::Service { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The service-provided error messages (empty unless this is an
    /// [`Api`](Self::Api) error).
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Api { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Returns `true` if any service-provided message contains `needle`
    /// (ASCII case-insensitive).
    pub fn message_contains(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        self.messages()
            .iter()
            .any(|m| m.to_ascii_lowercase().contains(&needle))
    }

    /// Server-requested delay before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}
