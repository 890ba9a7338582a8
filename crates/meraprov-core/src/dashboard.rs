// ── Dashboard session ──
//
// Bundles the API client with the retry policy and the per-device
// concurrency bound. The provisioning steps (network, claim, update,
// template) are implemented as methods on this type in their own modules.

use meraprov_api::{DashboardClient, TlsMode, TransportConfig};
use tracing::debug;

use crate::config::{DashboardConfig, TlsVerification};
use crate::error::CoreError;
use crate::retry::RetryPolicy;

/// Handle to the Dashboard API used by every provisioning step.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub(crate) client: DashboardClient,
    pub(crate) retry: RetryPolicy,
    pub(crate) concurrency: usize,
}

impl Dashboard {
    /// Build an authenticated session from configuration.
    pub fn new(config: &DashboardConfig) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let client =
            DashboardClient::from_api_key(&config.base_url, &config.api_key, &transport)?;
        debug!(base_url = %client.base_url(), "dashboard client ready");

        Ok(Self::from_client(
            client,
            config.retry.clone(),
            config.concurrency,
        ))
    }

    /// Wrap an existing client.
    pub fn from_client(client: DashboardClient, retry: RetryPolicy, concurrency: usize) -> Self {
        Self {
            client,
            retry,
            concurrency: concurrency.max(1),
        }
    }
}

fn build_transport(config: &DashboardConfig) -> TransportConfig {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
    };

    TransportConfig {
        tls,
        ..TransportConfig::default()
    }
    .with_timeout(config.timeout)
}
