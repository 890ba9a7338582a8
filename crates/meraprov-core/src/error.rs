// ── Core error types ──
//
// Domain errors for the provisioning workflow. Each variant names the
// identifier that failed (serial, network id, template id) so a run report
// can say exactly what went wrong. The `From<meraprov_api::Error>` impl gives
// the generic translation; each step refines it for the conditions only that
// step can recognize.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use strum::{Display, EnumString};
use thiserror::Error;

/// Failure taxonomy shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connectivity or timeout.
    Transport,
    /// Invalid, expired or under-privileged credential.
    Auth,
    /// 4xx: bad input, conflict, not found. Local validation failures too.
    Client,
    /// 5xx and throttling.
    Service,
    /// Malformed response body.
    Decode,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot reach the Dashboard API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Dashboard API request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Generic API outcomes ─────────────────────────────────────────
    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Rate limited by the Dashboard API -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Dashboard API service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Malformed response from the Dashboard API: {message}")]
    Decode { message: String },

    // ── Input validation ─────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Network creation ─────────────────────────────────────────────
    #[error("A network named '{name}' already exists in this organization")]
    DuplicateName { name: String },

    // ── Device claiming ──────────────────────────────────────────────
    #[error("Device {serial} is already claimed")]
    AlreadyClaimed { serial: String },

    #[error("Device {serial} is not in the organization's inventory")]
    UnknownSerial { serial: String },

    #[error("Network {network_id} not found")]
    NetworkNotFound { network_id: String },

    // ── Device updates ───────────────────────────────────────────────
    #[error("Device {serial} not found")]
    DeviceNotFound { serial: String },

    #[error("Address for device {serial} could not be geocoded: '{address}'")]
    AddressUnparseable { serial: String, address: String },

    #[error("Device name '{name}' is shared by {}", .serials.join(", "))]
    NameCollision { name: String, serials: Vec<String> },

    // ── Template binding ─────────────────────────────────────────────
    #[error("Configuration template {template_id} not found")]
    TemplateNotFound { template_id: String },

    #[error("Network {network_id} is already bound to a configuration template")]
    AlreadyBound { network_id: String },

    #[error(
        "Template {template_id} is incompatible with the product types of network {network_id}: {message}"
    )]
    IncompatibleProductTypes {
        network_id: String,
        template_id: String,
        message: String,
    },

    // ── Stage aggregation ────────────────────────────────────────────
    #[error("{} of {total} devices failed ({}); first failure: {first}", .failed.len(), .failed.join(", "))]
    DeviceFailures {
        failed: Vec<String>,
        total: usize,
        first: Box<CoreError>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Where this failure sits in the taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => FailureKind::Transport,
            Self::AuthenticationFailed { .. } => FailureKind::Auth,
            Self::RateLimited { .. } | Self::Service { .. } => FailureKind::Service,
            Self::Decode { .. } => FailureKind::Decode,
            Self::DeviceFailures { first, .. } => first.kind(),
            Self::Rejected { .. }
            | Self::Validation { .. }
            | Self::DuplicateName { .. }
            | Self::AlreadyClaimed { .. }
            | Self::UnknownSerial { .. }
            | Self::NetworkNotFound { .. }
            | Self::DeviceNotFound { .. }
            | Self::AddressUnparseable { .. }
            | Self::NameCollision { .. }
            | Self::TemplateNotFound { .. }
            | Self::AlreadyBound { .. }
            | Self::IncompatibleProductTypes { .. }
            | Self::Config { .. } => FailureKind::Client,
        }
    }

    /// Transport and service failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), FailureKind::Transport | FailureKind::Service)
    }
}

// ── Report serialization ─────────────────────────────────────────────

impl Serialize for CoreError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CoreError", 2)?;
        s.serialize_field("kind", &self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<meraprov_api::Error> for CoreError {
    fn from(err: meraprov_api::Error) -> Self {
        use meraprov_api::Error as ApiError;

        match err {
            ApiError::Authentication { message, .. } | ApiError::InvalidApiKey(message) => {
                CoreError::AuthenticationFailed { message }
            }
            // Timeouts arrive as `ApiError::Timeout` with the configured limit.
            ApiError::Transport(ref e) => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            ApiError::Api { status, errors } => CoreError::Rejected {
                status,
                message: if errors.is_empty() {
                    "no details provided".into()
                } else {
                    errors.join("; ")
                },
            },
            ApiError::Service { status, message } => CoreError::Service { status, message },
            ApiError::Deserialization { message, body: _ } => CoreError::Decode { message },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_rejection_maps_to_client_kind() {
        let err = CoreError::from(meraprov_api::Error::Api {
            status: 400,
            errors: vec!["bad".into()],
        });
        assert!(matches!(err, CoreError::Rejected { status: 400, .. }));
        assert_eq!(err.kind(), FailureKind::Client);
        assert!(!err.is_retryable());
    }

    #[test]
    fn service_and_rate_limit_are_retryable() {
        let svc = CoreError::from(meraprov_api::Error::Service {
            status: 502,
            message: "bad gateway".into(),
        });
        let throttled = CoreError::from(meraprov_api::Error::RateLimited {
            retry_after_secs: 1,
        });
        assert!(svc.is_retryable());
        assert!(throttled.is_retryable());
    }

    #[test]
    fn timeout_keeps_configured_limit() {
        let err = CoreError::from(meraprov_api::Error::Timeout { timeout_secs: 30 });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 30 }));
        assert!(err.to_string().contains("30"), "{err}");
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_failures_map_to_auth_kind() {
        let err = CoreError::from(meraprov_api::Error::Authentication {
            status: 401,
            message: "Invalid API key".into(),
        });
        assert_eq!(err.kind(), FailureKind::Auth);
    }

    #[test]
    fn device_failures_take_kind_of_first() {
        let err = CoreError::DeviceFailures {
            failed: vec!["A".into()],
            total: 2,
            first: Box::new(CoreError::AlreadyClaimed { serial: "A".into() }),
        };
        assert_eq!(err.kind(), FailureKind::Client);
        assert_eq!(
            err.to_string(),
            "1 of 2 devices failed (A); first failure: Device A is already claimed"
        );
    }

    #[test]
    fn serializes_as_kind_and_message() {
        let err = CoreError::DeviceNotFound {
            serial: "Q2BN-0000-0000".into(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "kind": "client", "message": "Device Q2BN-0000-0000 not found" })
        );
    }
}
