//! `meraprov run`: provision the network described by the run definition.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use meraprov_core::{
    Dashboard, FailureKind, Provisioner, ProvisioningPlan, RunReport, RunState, Stage,
};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::debug;

use crate::cli::{GlobalOpts, RunArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::load(global)?;
    let plan = ProvisioningPlan::build(util::build_request(&config, args)?)?;

    let explicit = global.api_key.clone().map(SecretString::from);
    let (api_key, source) = meraprov_config::resolve_api_key(&config, explicit)?;
    debug!(%source, "resolved API key");

    let mut dashboard_config = config.dashboard_config(api_key)?;
    if let Some(secs) = global.timeout {
        dashboard_config.timeout = Duration::from_secs(secs);
    }
    if let Some(n) = global.concurrency {
        dashboard_config.concurrency = n.max(1);
    }

    let prompt = format!(
        "Create network '{}' in organization {} and provision {} device(s)?",
        plan.network.name,
        plan.organization_id,
        plan.devices.len()
    );
    if !util::confirm(&prompt, "run", global.yes)? {
        return Ok(());
    }

    let provisioner = Provisioner::new(Dashboard::new(&dashboard_config)?);

    let spinner = (!global.quiet && std::io::stderr().is_terminal()).then(spinner);
    let watcher = spinner
        .clone()
        .map(|bar| tokio::spawn(follow_progress(provisioner.subscribe(), bar)));

    let report = provisioner.execute(&plan).await;

    if let Some(handle) = watcher {
        handle.abort();
    }
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let rendered = output::render_report(global.output, &report, output::should_color(global.color))?;
    output::print_output(&rendered, global.quiet);

    into_result(&report)
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_message(describe(&RunState::Start));
    bar
}

/// Mirror state transitions onto the spinner until the run ends.
async fn follow_progress(mut states: watch::Receiver<RunState>, bar: ProgressBar) {
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        bar.set_message(describe(&state));
        if state.is_terminal() {
            break;
        }
    }
}

fn describe(state: &RunState) -> String {
    match state {
        RunState::Start => "Creating network".into(),
        RunState::NetworkCreated => "Claiming devices".into(),
        RunState::DevicesClaimed => "Naming and locating devices".into(),
        RunState::DevicesUpdated => "Binding template".into(),
        RunState::TemplateBound | RunState::Done => "Done".into(),
        RunState::Failed { stage, .. } => format!("Failed at {stage}"),
    }
}

fn into_result(report: &RunReport) -> Result<(), CliError> {
    let Some((stage, cause)) = report.failure() else {
        return Ok(());
    };

    let progress = match &report.network_id {
        Some(id) => format!(
            "Network {id} was created and left in place; stages after {stage} were not attempted."
        ),
        None => no_network_hint(stage, cause.kind()).into(),
    };
    Err(CliError::RunFailed {
        stage,
        message: cause.to_string(),
        progress,
    })
}

/// The create request may have landed even though no id came back.
fn no_network_hint(stage: Stage, kind: FailureKind) -> &'static str {
    match (stage, kind) {
        (
            Stage::NetworkCreated,
            FailureKind::Transport | FailureKind::Service | FailureKind::Decode,
        ) => "The network may have been created; check the Dashboard before running again.",
        _ => "No changes were made.",
    }
}
