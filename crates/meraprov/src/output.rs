//! Output formatting: table, JSON, YAML.
//!
//! Structured formats serialize the core types directly; the table format
//! builds `tabled` rows plus a short summary header.

use std::io::{self, IsTerminal, Write};

use chrono::TimeDelta;
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use meraprov_core::{DeviceOutcome, ProvisioningPlan, RunReport, RunState, StepStatus};

use crate::cli::{ColorMode, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Structured renderers ─────────────────────────────────────────────

/// Render any serializable value in a structured format. `None` for table.
pub fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<Option<String>, crate::error::CliError> {
    Ok(match format {
        OutputFormat::Table => None,
        OutputFormat::Json => Some(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Some(serde_json::to_string(data)?),
        OutputFormat::Yaml => Some(serde_yaml::to_string(data)?),
    })
}

// ── Plan ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
}

pub fn render_plan(
    format: OutputFormat,
    plan: &ProvisioningPlan,
) -> Result<String, crate::error::CliError> {
    if let Some(out) = render_structured(format, plan)? {
        return Ok(out);
    }

    let rows: Vec<PlanRow> = plan
        .devices
        .iter()
        .map(|d| PlanRow {
            serial: d.device.serial.to_string(),
            model: d.device.model.clone(),
            name: d.name.clone(),
            address: d.device.address.clone(),
        })
        .collect();

    let header = format!(
        "Organization: {}\nNetwork:      {} ({}, {})\nTemplate:     {} (auto-bind: {})\n",
        plan.organization_id,
        plan.network.name,
        plan.network.product_types,
        plan.network.time_zone,
        plan.template.template_id,
        plan.template.auto_bind,
    );
    Ok(format!(
        "{header}\n{}",
        Table::new(rows).with(Style::rounded())
    ))
}

// ── Run report ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Claim")]
    claim: String,
    #[tabled(rename = "Update")]
    update: String,
}

fn status_label(status: &StepStatus, color: bool) -> String {
    let (label, detail) = match status {
        StepStatus::Succeeded => ("ok", None),
        StepStatus::Failed(cause) => ("failed", Some(cause.kind().to_string())),
        StepStatus::NotAttempted => ("-", None),
    };
    let text = detail.map_or_else(|| label.to_owned(), |k| format!("{label} ({k})"));
    if !color {
        return text;
    }
    match status {
        StepStatus::Succeeded => text.green().to_string(),
        StepStatus::Failed(_) => text.red().to_string(),
        StepStatus::NotAttempted => text.dimmed().to_string(),
    }
}

fn outcome_for<'a>(outcomes: &'a [DeviceOutcome], serial: &str) -> Option<&'a DeviceOutcome> {
    outcomes.iter().find(|o| o.serial.as_str() == serial)
}

fn format_elapsed(delta: TimeDelta) -> String {
    let ms = delta.num_milliseconds().max(0);
    format!("{}.{:03}s", ms / 1000, ms % 1000)
}

pub fn render_report(
    format: OutputFormat,
    report: &RunReport,
    color: bool,
) -> Result<String, crate::error::CliError> {
    if let Some(out) = render_structured(format, report)? {
        return Ok(out);
    }

    let stages: Vec<StageRow> = report
        .stages
        .iter()
        .map(|s| StageRow {
            stage: s.stage.to_string(),
            status: status_label(&s.status, color),
            detail: s.status.error().map(ToString::to_string).unwrap_or_default(),
        })
        .collect();

    let devices: Vec<DeviceRow> = report
        .claims
        .iter()
        .map(|claim| {
            let update = outcome_for(&report.updates, claim.serial.as_str());
            DeviceRow {
                serial: claim.serial.to_string(),
                name: update.and_then(|u| u.name.clone()).unwrap_or_default(),
                claim: status_label(&claim.status, color),
                update: update.map_or_else(
                    || status_label(&StepStatus::NotAttempted, color),
                    |u| status_label(&u.status, color),
                ),
            }
        })
        .collect();

    let mut outcome = match &report.state {
        RunState::Done => "complete".to_owned(),
        RunState::Failed { stage, .. } => format!("halted at {stage}"),
        other => other.to_string(),
    };
    if let Some(end) = report.finished_at {
        outcome.push_str(&format!(" in {}", format_elapsed(end - report.started_at)));
    }
    let network_id = report
        .network_id
        .as_ref()
        .map_or_else(|| "(not created)".to_owned(), ToString::to_string);

    let mut out = format!(
        "Network:  {} [{}]\nTemplate: {}\nRun:      {}\n\n{}",
        report.network_name,
        network_id,
        report.template_id,
        outcome,
        Table::new(stages).with(Style::rounded()),
    );
    if !devices.is_empty() {
        out.push_str("\n\n");
        out.push_str(&Table::new(devices).with(Style::rounded()).to_string());
    }
    Ok(out)
}
