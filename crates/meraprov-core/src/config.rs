// ── Runtime connection configuration ──
//
// These types describe *how* to talk to the Dashboard API. They carry the
// credential and connection tuning, but never touch disk: the CLI builds a
// `DashboardConfig` from its config file and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::retry::RetryPolicy;

/// Default bound on concurrent per-device requests within a stage.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled root store (strict).
    #[default]
    SystemDefaults,
    /// Also trust a custom CA certificate file.
    CustomCa(PathBuf),
}

/// Configuration for one Dashboard API session.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API base URL, e.g. `https://api.meraki.com/api/v1`.
    pub base_url: String,
    /// Dashboard API key.
    pub api_key: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Maximum in-flight per-device requests.
    pub concurrency: usize,
}

impl DashboardConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            base_url: meraprov_api::DEFAULT_BASE_URL.into(),
            api_key,
            tls: TlsVerification::default(),
            timeout: meraprov_api::transport::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}
