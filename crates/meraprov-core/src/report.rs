// ── Run state and report ──
//
// The orchestrator's state machine and the record it leaves behind. The
// report keeps the status of every stage, including the ones never reached,
// so partial progress (a created network, claimed devices) is visible after
// a failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::CoreError;
use crate::model::{NetworkId, OrganizationId, Serial, TemplateId};

/// A unit of work in a run, named after the state it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    NetworkCreated,
    DevicesClaimed,
    DevicesUpdated,
    TemplateBound,
}

impl Stage {
    /// The run state reached when this stage succeeds.
    pub fn reached_state(self) -> RunState {
        match self {
            Self::Validation => RunState::Start,
            Self::NetworkCreated => RunState::NetworkCreated,
            Self::DevicesClaimed => RunState::DevicesClaimed,
            Self::DevicesUpdated => RunState::DevicesUpdated,
            Self::TemplateBound => RunState::TemplateBound,
        }
    }
}

/// Where a run is.
#[derive(Debug, Clone, Display, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Start,
    NetworkCreated,
    DevicesClaimed,
    DevicesUpdated,
    TemplateBound,
    Done,
    #[strum(to_string = "Failed at {stage}")]
    Failed { stage: Stage, cause: CoreError },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

/// Outcome of one stage, or of one device within a stage.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "cause", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed(CoreError),
    NotAttempted,
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    pub(crate) fn from_result(result: Result<(), CoreError>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(cause) => Self::Failed(cause),
        }
    }
}

/// Per-device result within the claim or update stage.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceOutcome {
    pub serial: Serial,
    /// Display name applied (update stage only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: StepStatus,
}

/// Collapse per-device outcomes into a stage failure, if any device failed.
pub fn stage_failure(outcomes: &[DeviceOutcome]) -> Option<CoreError> {
    let failed: Vec<&DeviceOutcome> = outcomes.iter().filter(|o| !o.status.is_success()).collect();
    let first = failed.first()?.status.error()?.clone();

    Some(CoreError::DeviceFailures {
        failed: failed.iter().map(|o| o.serial.to_string()).collect(),
        total: outcomes.len(),
        first: Box::new(first),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Everything a run did, for display and for a caller deciding what to
/// clean up.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub organization_id: OrganizationId,
    pub network_name: String,
    pub template_id: TemplateId,
    /// Set once the network exists, even if a later stage failed.
    pub network_id: Option<NetworkId>,
    pub state: RunState,
    pub stages: Vec<StageReport>,
    pub claims: Vec<DeviceOutcome>,
    pub updates: Vec<DeviceOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub(crate) fn new(
        organization_id: OrganizationId,
        network_name: String,
        template_id: TemplateId,
    ) -> Self {
        Self {
            organization_id,
            network_name,
            template_id,
            network_id: None,
            state: RunState::Start,
            stages: Stage::iter()
                .map(|stage| StageReport {
                    stage,
                    status: StepStatus::NotAttempted,
                })
                .collect(),
            claims: Vec::new(),
            updates: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, stage: Stage, status: StepStatus) {
        if let Some(entry) = self.stages.iter_mut().find(|s| s.stage == stage) {
            entry.status = status;
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, RunState::Done)
    }

    /// The stage the run halted at and why.
    pub fn failure(&self) -> Option<(Stage, &CoreError)> {
        match &self.state {
            RunState::Failed { stage, cause } => Some((*stage, cause)),
            _ => None,
        }
    }

    pub fn status(&self, stage: Stage) -> &StepStatus {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map_or(&StepStatus::NotAttempted, |s| &s.status)
    }
}
