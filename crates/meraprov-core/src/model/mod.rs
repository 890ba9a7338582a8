// ── Domain model ──
//
// Validated input types for a provisioning run. Construction is the only
// place validation happens; everything downstream trusts these values.

pub mod device;
pub mod ids;
pub mod network;

pub use device::{Device, Roster, derive_device_name};
pub use ids::{NetworkId, OrganizationId, Serial, TemplateId};
pub use network::{NetworkSpec, ProductType, ProductTypes, TimeZone};
