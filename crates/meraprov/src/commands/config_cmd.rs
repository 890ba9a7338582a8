//! Config subcommand handlers.

use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

/// Map an interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = util::load(global)?;
            let shown = config.redacted();

            let rendered = match global.output {
                OutputFormat::Table => {
                    let source = meraprov_config::resolve_api_key(&config, None)
                        .map_or_else(|_| "not configured".to_owned(), |(_, s)| s.to_string());
                    format!("# API key: {source}\n{}", shown.to_toml()?)
                }
                format => output::render_structured(format, &shown)?.unwrap_or_default(),
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(meraprov_config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetKey { organization } => {
            let organization_id = match organization {
                Some(org) => org.clone(),
                None => util::load(global)?.organization_id,
            };

            let key = rpassword::prompt_password(format!(
                "Dashboard API key for organization {organization_id}: "
            ))
            .map_err(prompt_err)?;
            if key.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "API key cannot be empty".into(),
                });
            }

            meraprov_config::store_api_key(&organization_id, &SecretString::from(key))?;
            if !global.quiet {
                eprintln!("API key stored in the system keyring for organization {organization_id}");
            }
            Ok(())
        }
    }
}
