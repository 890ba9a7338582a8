//! `meraprov plan`: validate and show what a run would do, offline.

use meraprov_core::ProvisioningPlan;
use tracing::debug;

use crate::cli::{GlobalOpts, RunArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::load(global)?;
    let request = util::build_request(&config, args)?;
    debug!(naming = %request.naming, devices = request.roster.len(), "building plan");

    let plan = ProvisioningPlan::build(request)?;
    let rendered = output::render_plan(global.output, &plan)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
