// Async HTTP client for the Meraki Dashboard API (v1).
//
// Base path: /api/v1/
// Auth: X-Cisco-Meraki-API-Key header

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    BindNetworkRequest, ClaimDevicesRequest, CreateNetworkRequest, DeviceResponse, ErrorResponse,
    NetworkResponse, UpdateDeviceRequest,
};

/// Global Dashboard API endpoint. Regional shards (e.g. `api-mp.meraki.com`)
/// can be configured instead.
pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-Cisco-Meraki-API-Key";

/// Delay assumed when a 429 arrives without a usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Dashboard API.
///
/// Cheap to clone; clones share the connection pool. Never retries on its
/// own: callers decide which failures are worth another attempt.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl DashboardClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects the API key (marked sensitive so it never shows up in debug
    /// output) and `Content-Type: application/json` as default headers.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| Error::InvalidApiKey(format!("not a valid header value: {e}")))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    ///
    /// `timeout` should match the one the client was built with; it is only
    /// used to report timeouts.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Ensure the base URL ends in `/api/v1/`, accepting bare hosts.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/v1/"));
        }

        Ok(url)
    }

    /// The normalized base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append `path` (e.g. `/devices/Q2BN-TXYH-KJLU`) to the base URL,
    /// percent-encoding each segment.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    // ── Request dispatch ─────────────────────────────────────────────

    /// Issue one request and decode the JSON response.
    ///
    /// A timeout while reading the body is reported like one while waiting
    /// for headers, with the configured limit.
    ///
    /// An empty success body decodes as JSON `null`, so acknowledgement-only
    /// endpoints can be read into `()` or [`IgnoredAny`].
    pub async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path)?;
        debug!(%method, %url, "dashboard request");

        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = resp.status();
        debug!(%method, path, status = status.as_u16(), "dashboard response");

        if status.is_success() {
            self.decode(resp).await
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let raw = resp.text().await.unwrap_or_default();
        let errors = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(parsed) => parsed.errors,
            Err(_) if raw.trim().is_empty() => Vec::new(),
            Err(_) => vec![raw.trim().to_owned()],
        };
        let message = if errors.is_empty() {
            status.to_string()
        } else {
            errors.join("; ")
        };

        match status.as_u16() {
            code @ (401 | 403) => Error::Authentication {
                status: code,
                message,
            },
            429 => Error::RateLimited {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            code if status.is_server_error() => Error::Service {
                status: code,
                message,
            },
            code => Error::Api {
                status: code,
                errors,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Networks ─────────────────────────────────────────────────────

    pub async fn create_network(
        &self,
        organization_id: &str,
        body: &CreateNetworkRequest,
    ) -> Result<NetworkResponse, Error> {
        self.send(
            Method::POST,
            &format!("/organizations/{organization_id}/networks"),
            Some(body),
        )
        .await
    }

    /// Bind a network to a configuration template.
    pub async fn bind_network(
        &self,
        network_id: &str,
        body: &BindNetworkRequest,
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .send(Method::POST, &format!("/networks/{network_id}/bind"), Some(body))
            .await?;
        Ok(())
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Claim serials into a network. The response body carries nothing the
    /// caller needs beyond success.
    pub async fn claim_devices(&self, network_id: &str, serials: &[String]) -> Result<(), Error> {
        let body = ClaimDevicesRequest {
            serials: serials.to_vec(),
        };
        let _: IgnoredAny = self
            .send(
                Method::POST,
                &format!("/networks/{network_id}/devices/claim"),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    /// Update a device. The service usually echoes the device record back,
    /// but an empty acknowledgement is accepted too.
    pub async fn update_device(
        &self,
        serial: &str,
        body: &UpdateDeviceRequest,
    ) -> Result<Option<DeviceResponse>, Error> {
        self.send(Method::PUT, &format!("/devices/{serial}"), Some(body))
            .await
    }

    pub async fn get_device(&self, serial: &str) -> Result<DeviceResponse, Error> {
        self.send::<_, ()>(Method::GET, &format!("/devices/{serial}"), None)
            .await
    }
}
