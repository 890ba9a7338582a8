//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use meraprov_config::ConfigError;
use meraprov_core::{CoreError, FailureKind, Stage};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const RUN_FAILED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Dashboard API at {url}")]
    #[diagnostic(
        code(meraprov::connection_failed),
        help(
            "{reason}\n\
             Check network access and `api.base_url` in the run definition."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(meraprov::timeout),
        help("Increase the timeout with --timeout or `api.timeout_secs`.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(meraprov::auth_failed),
        help(
            "Verify the API key has access to the organization.\n\
             Store a new one with: meraprov config set-key"
        )
    )]
    AuthFailed { message: String },

    #[error("No API key for organization {organization_id}")]
    #[diagnostic(
        code(meraprov::no_credentials),
        help(
            "Set {env_var}, pass --api-key, or run: meraprov config set-key"
        )
    )]
    NoCredentials {
        organization_id: String,
        env_var: String,
    },

    // ── API outcomes ─────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(meraprov::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(code(meraprov::conflict))]
    Conflict { message: String },

    #[error("Dashboard API error: {message}")]
    #[diagnostic(code(meraprov::api_error))]
    ApiError { kind: FailureKind, message: String },

    // ── Provisioning ─────────────────────────────────────────────────
    #[error("Provisioning failed at {stage}: {message}")]
    #[diagnostic(
        code(meraprov::run_failed),
        help("{progress}")
    )]
    RunFailed {
        stage: Stage,
        message: String,
        progress: String,
    },

    #[error("Device name '{name}' would be shared by {serials}")]
    #[diagnostic(
        code(meraprov::name_collision),
        help(
            "Devices of the same model get the same derived name.\n\
             Set `naming = \"suffix\"` under [network] or pass --naming suffix."
        )
    )]
    NameCollision { name: String, serials: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(meraprov::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Run definition not found")]
    #[diagnostic(
        code(meraprov::no_config),
        help(
            "Pass one with --config, or create it at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(meraprov::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {message}")]
    #[diagnostic(code(meraprov::keyring))]
    Keyring { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(meraprov::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::RunFailed { .. } => exit_code::RUN_FAILED,
            Self::Validation { .. }
            | Self::NameCollision { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Invalid(core) => CliError::from(core),
            ConfigError::NoCredentials {
                organization_id,
                env_var,
            } => CliError::NoCredentials {
                organization_id,
                env_var,
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Serialization(e) => CliError::Render(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let kind = err.kind();
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::NameCollision { name, serials } => CliError::NameCollision {
                name,
                serials: serials.join(", "),
            },

            CoreError::NetworkNotFound { network_id } => CliError::NotFound {
                resource_type: "network".into(),
                identifier: network_id,
            },
            CoreError::DeviceNotFound { serial } | CoreError::UnknownSerial { serial } => {
                CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: serial,
                }
            }
            CoreError::TemplateNotFound { template_id } => CliError::NotFound {
                resource_type: "template".into(),
                identifier: template_id,
            },

            err @ (CoreError::DuplicateName { .. }
            | CoreError::AlreadyClaimed { .. }
            | CoreError::AlreadyBound { .. }) => CliError::Conflict {
                message: err.to_string(),
            },

            other => CliError::ApiError {
                kind,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::AuthenticationFailed {
                    message: "bad key".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::AlreadyClaimed { serial: "A".into() },
                exit_code::CONFLICT,
            ),
            (
                CoreError::TemplateNotFound {
                    template_id: "L_1".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (CoreError::Timeout { timeout_secs: 30 }, exit_code::TIMEOUT),
            (
                CoreError::NameCollision {
                    name: "n_X".into(),
                    serials: vec!["A".into(), "B".into()],
                },
                exit_code::USAGE,
            ),
            (
                CoreError::Service {
                    status: 502,
                    message: "bad gateway".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn missing_config_maps_to_no_config() {
        let err = CliError::from(ConfigError::NotFound {
            path: "/tmp/x.toml".into(),
        });
        assert!(matches!(err, CliError::NoConfig { ref path } if path == "/tmp/x.toml"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
