// Shared transport configuration for building reqwest::Client instances.
//
// Owns TLS roots, the per-request timeout, and the user agent so every
// client built for the Dashboard API gets the same settings.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

/// Default per-request timeout. The Dashboard API answers well within this
/// for every provisioning endpoint.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which root certificates to trust.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled webpki roots.
    #[default]
    System,
    /// Additionally trust a CA certificate from the given PEM file
    /// (TLS-intercepting corporate proxies).
    CustomCa(PathBuf),
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("meraprov/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` with the given default headers.
    ///
    /// Used by [`DashboardClient`](crate::DashboardClient) to inject the
    /// API key and content-type headers on every request.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers);

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
