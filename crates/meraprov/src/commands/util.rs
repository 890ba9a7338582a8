//! Shared helpers for command handlers.

use meraprov_config::Config;
use meraprov_core::{NamingPolicy, ProvisioningRequest};

use crate::cli::{GlobalOpts, NamingArg, RunArgs};
use crate::error::CliError;

/// Load the run definition named by `--config` (or the default path).
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(meraprov_config::load_config(global.config.as_deref())?)
}

/// Validate the run definition into a request, applying `--naming`.
pub fn build_request(config: &Config, args: &RunArgs) -> Result<ProvisioningRequest, CliError> {
    let mut request = config.to_request()?;
    if let Some(naming) = args.naming {
        request.naming = match naming {
            NamingArg::Strict => NamingPolicy::Strict,
            NamingArg::Suffix => NamingPolicy::Suffix,
        };
    }
    Ok(request)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    use std::io::IsTerminal;

    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
