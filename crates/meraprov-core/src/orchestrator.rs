// ── Provisioning orchestrator ──
//
// Sequences the four steps: create network, claim devices, update devices,
// bind template. Each stage starts only after the previous one succeeded; the
// first failure halts the run and nothing is rolled back. Every transition is
// published on a watch channel and recorded in the returned report.

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::plan::{ProvisioningPlan, ProvisioningRequest};
use crate::report::{RunReport, RunState, Stage, StepStatus, stage_failure};

/// Drives provisioning runs against one Dashboard session.
pub struct Provisioner {
    dashboard: Dashboard,
    state: watch::Sender<RunState>,
}

impl Provisioner {
    pub fn new(dashboard: Dashboard) -> Self {
        let (state, _) = watch::channel(RunState::Start);
        Self { dashboard, state }
    }

    /// Subscribe to state transitions of the current and later runs.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Snapshot of the latest published state.
    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Validate the request into a plan, then execute it.
    ///
    /// Invalid input fails the run at [`Stage::Validation`] before any
    /// request is sent.
    pub async fn run(&self, request: ProvisioningRequest) -> RunReport {
        let mut report = RunReport::new(
            request.organization_id.clone(),
            request.network.name.clone(),
            request.template.template_id.clone(),
        );
        self.state.send_replace(RunState::Start);

        match ProvisioningPlan::build(request) {
            Ok(plan) => {
                report.record(Stage::Validation, StepStatus::Succeeded);
                self.drive(&plan, report).await
            }
            Err(cause) => self.fail(report, Stage::Validation, cause),
        }
    }

    /// Execute a plan that was already built and shown to the operator.
    pub async fn execute(&self, plan: &ProvisioningPlan) -> RunReport {
        let mut report = RunReport::new(
            plan.organization_id.clone(),
            plan.network.name.clone(),
            plan.template.template_id.clone(),
        );
        self.state.send_replace(RunState::Start);
        report.record(Stage::Validation, StepStatus::Succeeded);
        self.drive(plan, report).await
    }

    async fn drive(&self, plan: &ProvisioningPlan, mut report: RunReport) -> RunReport {
        info!(
            network = %plan.network.name,
            devices = plan.devices.len(),
            "provisioning run started"
        );

        // ── Network ──
        let network_id = match self
            .dashboard
            .create_network(&plan.organization_id, &plan.network)
            .await
        {
            Ok(id) => id,
            Err(cause) => return self.fail(report, Stage::NetworkCreated, cause),
        };
        report.network_id = Some(network_id.clone());
        self.advance(&mut report, Stage::NetworkCreated);

        // ── Claim ──
        match self
            .dashboard
            .claim_devices(&network_id, &plan.serials())
            .await
        {
            Ok(outcomes) => {
                let failure = stage_failure(&outcomes);
                report.claims = outcomes;
                if let Some(cause) = failure {
                    return self.fail(report, Stage::DevicesClaimed, cause);
                }
            }
            Err(cause) => return self.fail(report, Stage::DevicesClaimed, cause),
        }
        self.advance(&mut report, Stage::DevicesClaimed);

        // ── Update ──
        report.updates = self.dashboard.update_devices(&plan.devices).await;
        if let Some(cause) = stage_failure(&report.updates) {
            return self.fail(report, Stage::DevicesUpdated, cause);
        }
        self.advance(&mut report, Stage::DevicesUpdated);

        // ── Bind ──
        if let Err(cause) = self
            .dashboard
            .bind_template(
                &network_id,
                &plan.template.template_id,
                plan.template.auto_bind,
            )
            .await
        {
            return self.fail(report, Stage::TemplateBound, cause);
        }
        self.advance(&mut report, Stage::TemplateBound);

        report.state = RunState::Done;
        report.finished_at = Some(Utc::now());
        self.state.send_replace(RunState::Done);
        info!(%network_id, "provisioning run complete");
        report
    }

    fn advance(&self, report: &mut RunReport, stage: Stage) {
        report.record(stage, StepStatus::Succeeded);
        report.state = stage.reached_state();
        self.state.send_replace(report.state.clone());
        info!(%stage, "stage complete");
    }

    fn fail(&self, mut report: RunReport, stage: Stage, cause: CoreError) -> RunReport {
        error!(%stage, kind = %cause.kind(), error = %cause, "provisioning run halted");
        report.record(stage, StepStatus::Failed(cause.clone()));
        report.state = RunState::Failed { stage, cause };
        report.finished_at = Some(Utc::now());
        self.state.send_replace(report.state.clone());
        report
    }
}
