//! Run definition for meraprov.
//!
//! One TOML file describes one provisioning run: the organization, the
//! network to create, the template to bind and the device roster. This crate
//! loads it (file + `MERAPROV_*` environment), resolves the API key through
//! the credential chain, and translates both into `meraprov_core` types.
//! Core never sees these types; it receives a `ProvisioningRequest` and a
//! `DashboardConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use meraprov_core::{
    CoreError, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DashboardConfig, Device, NamingPolicy,
    NetworkSpec, OrganizationId, ProductTypes, ProvisioningRequest, RetryPolicy, Roster, Serial,
    TemplateBinding, TemplateId, TimeZone, TlsVerification,
};

/// Environment variable consulted for the API key unless the config names
/// another one.
pub const DEFAULT_API_KEY_ENV: &str = "MERAKI_DASHBOARD_API_KEY";

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "meraprov";

const ENV_PREFIX: &str = "MERAPROV_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(
        "no API key for organization {organization_id}: set {env_var}, pass --api-key, or run `meraprov config set-key`"
    )]
    NoCredentials {
        organization_id: String,
        env_var: String,
    },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level run definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Organization the network is created in.
    pub organization_id: String,

    /// Connection and credential settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// The network to create.
    pub network: NetworkSettings,

    /// The template to bind once devices are in place.
    pub template: TemplateSettings,

    /// Devices to claim, in provisioning order.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable containing the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API key (plaintext -- prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum in-flight per-device requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Path to an additional CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_key: None,
            timeout_secs: default_timeout(),
            concurrency: default_concurrency(),
            ca_cert: None,
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkSettings {
    pub name: String,

    /// IANA time zone, e.g. "Europe/London".
    pub timezone: String,

    /// Product types to enable, e.g. ["appliance", "switch"].
    pub product_types: Vec<String>,

    /// "strict" (refuse duplicate device names) or "suffix".
    #[serde(default = "default_naming")]
    pub naming: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateSettings {
    pub id: String,

    /// Push template settings onto the network instead of only associating.
    #[serde(default)]
    pub auto_bind: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub serial: String,
    /// Hardware model, e.g. "MX64".
    pub model: String,
    /// Street address the device is installed at.
    pub address: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    8000
}
fn default_naming() -> String {
    "strict".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "meraprov", "meraprov").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("meraprov");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the run definition from `path` (or the platform default) plus
/// `MERAPROV_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if !path.is_file() {
        return Err(ConfigError::NotFound { path });
    }
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::default("api", ApiSettings::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

impl Config {
    /// Validate every field and build the request a run executes.
    pub fn to_request(&self) -> Result<ProvisioningRequest, ConfigError> {
        let organization_id = OrganizationId::new(&self.organization_id)?;

        let network = NetworkSpec::new(
            &self.network.name,
            TimeZone::new(&self.network.timezone)?,
            ProductTypes::parse(&self.network.product_types)?,
        )?
        .with_tags(&self.network.tags)
        .with_notes(self.network.notes.clone());

        let naming: NamingPolicy =
            self.network
                .naming
                .parse()
                .map_err(|_| ConfigError::Validation {
                    field: "network.naming".into(),
                    reason: format!(
                        "expected 'strict' or 'suffix', got '{}'",
                        self.network.naming
                    ),
                })?;

        if self.devices.is_empty() {
            return Err(ConfigError::Validation {
                field: "devices".into(),
                reason: "at least one [[devices]] entry is required".into(),
            });
        }
        let devices = self
            .devices
            .iter()
            .map(|d| Device::new(Serial::new(&d.serial)?, &d.model, &d.address))
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(ProvisioningRequest {
            organization_id,
            network,
            template: TemplateBinding {
                template_id: TemplateId::new(&self.template.id)?,
                auto_bind: self.template.auto_bind,
            },
            roster: Roster::new(devices)?,
            naming,
        })
    }

    /// Connection settings for a Dashboard session with the given key.
    pub fn dashboard_config(&self, api_key: SecretString) -> Result<DashboardConfig, ConfigError> {
        let base_url: url::Url = self
            .api
            .base_url
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: "api.base_url".into(),
                reason: format!("invalid URL: {}", self.api.base_url),
            })?;

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "api.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }

        let retry = &self.api.retry;
        if retry.max_attempts == 0 {
            return Err(ConfigError::Validation {
                field: "api.retry.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }

        let tls = self
            .api
            .ca_cert
            .clone()
            .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa);

        Ok(DashboardConfig {
            base_url: base_url.to_string(),
            api_key,
            tls,
            timeout: Duration::from_secs(self.api.timeout_secs),
            retry: RetryPolicy {
                max_attempts: retry.max_attempts,
                initial_backoff: Duration::from_millis(retry.initial_backoff_ms),
                max_backoff: Duration::from_millis(retry.max_backoff_ms),
            },
            concurrency: self.api.concurrency.max(1),
        })
    }

    /// A copy safe to print: any plaintext key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api.api_key.is_some() {
            copy.api.api_key = Some("********".into());
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Where the API key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `--api-key` or `MERAKI_DASHBOARD_API_KEY` via the CLI.
    Explicit,
    /// The variable named by `api.api_key_env`.
    Environment(String),
    Keyring,
    /// `api.api_key` in the config file.
    Plaintext,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => f.write_str("command line"),
            Self::Environment(var) => write!(f, "environment (${var})"),
            Self::Keyring => f.write_str("system keyring"),
            Self::Plaintext => f.write_str("config file (plaintext)"),
        }
    }
}

/// Resolve the API key: explicit value, then `api.api_key_env`, then the
/// system keyring, then plaintext in the config.
pub fn resolve_api_key(
    config: &Config,
    explicit: Option<SecretString>,
) -> Result<(SecretString, CredentialSource), ConfigError> {
    resolve_with(
        config,
        explicit,
        |name| std::env::var(name).ok(),
        |account| {
            keyring::Entry::new(KEYRING_SERVICE, account)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_with(
    config: &Config,
    explicit: Option<SecretString>,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<(SecretString, CredentialSource), ConfigError> {
    // 1. CLI flag
    if let Some(key) = explicit {
        return Ok((key, CredentialSource::Explicit));
    }

    // 2. Configured env var
    let var = &config.api.api_key_env;
    if let Some(val) = env(var).filter(|v| !v.trim().is_empty()) {
        return Ok((
            SecretString::from(val),
            CredentialSource::Environment(var.clone()),
        ));
    }

    // 3. System keyring
    if let Some(secret) = keyring(&keyring_account(&config.organization_id)) {
        return Ok((SecretString::from(secret), CredentialSource::Keyring));
    }

    // 4. Plaintext in config
    if let Some(ref key) = config.api.api_key {
        warn!("using plaintext api_key from the config file; prefer the keyring or {var}");
        return Ok((SecretString::from(key.clone()), CredentialSource::Plaintext));
    }

    Err(ConfigError::NoCredentials {
        organization_id: config.organization_id.clone(),
        env_var: var.clone(),
    })
}

fn keyring_account(organization_id: &str) -> String {
    format!("{organization_id}/api-key")
}

/// Store an API key in the system keyring for an organization.
pub fn store_api_key(organization_id: &str, key: &SecretString) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;

    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(organization_id))?;
    entry.set_password(key.expose_secret())?;
    Ok(())
}
