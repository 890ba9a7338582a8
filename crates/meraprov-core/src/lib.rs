//! Provisioning workflow for Meraki networks, built on `meraprov-api`.
//!
//! A run takes a [`ProvisioningRequest`] through four remote stages:
//!
//! - **Network creation**: [`Dashboard::create_network`] creates the network
//!   and returns the id every later stage depends on.
//! - **Claiming**: [`Dashboard::claim_devices`] claims each roster serial into
//!   the network, one outcome per serial.
//! - **Updating**: [`Dashboard::update_devices`] gives each device its derived
//!   name (`<network>_<model>`) and street address.
//! - **Binding**: [`Dashboard::bind_template`] attaches the configuration
//!   template.
//!
//! The [`Provisioner`] sequences the stages, halts at the first failure and
//! returns a [`RunReport`] describing what happened at every stage. Transient
//! failures are retried per call according to the session's [`RetryPolicy`].

pub mod claim;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod network;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod retry;
pub mod template;
pub mod update;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_CONCURRENCY, DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::{CoreError, FailureKind};
pub use orchestrator::Provisioner;
pub use plan::{
    NamingPolicy, PlannedDevice, ProvisioningPlan, ProvisioningRequest, TemplateBinding,
    name_collisions,
};
pub use report::{DeviceOutcome, RunReport, RunState, Stage, StageReport, StepStatus};
pub use retry::RetryPolicy;

pub use meraprov_api::DEFAULT_BASE_URL;

pub use model::{
    Device, NetworkId, NetworkSpec, OrganizationId, ProductType, ProductTypes, Roster, Serial,
    TemplateId, TimeZone, derive_device_name,
};
