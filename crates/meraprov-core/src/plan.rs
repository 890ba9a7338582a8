// ── Provisioning plan ──
//
// Turns a request (validated inputs) into the exact set of names and
// bindings a run will apply. Planning is pure: no remote calls, so the CLI
// can show a plan without a network connection.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::CoreError;
use crate::model::{
    Device, NetworkSpec, OrganizationId, Roster, Serial, TemplateId, derive_device_name,
};

/// What to do when two devices derive the same display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Refuse to run.
    #[default]
    Strict,
    /// Keep the first name as derived; append `_2`, `_3`, ... to the rest.
    Suffix,
}

/// Template to bind once devices are in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateBinding {
    pub template_id: TemplateId,
    /// Push template settings onto existing network settings. `false` only
    /// associates the template.
    pub auto_bind: bool,
}

/// Validated inputs for one run.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub organization_id: OrganizationId,
    pub network: NetworkSpec,
    pub template: TemplateBinding,
    pub roster: Roster,
    pub naming: NamingPolicy,
}

/// A roster device with the display name it will be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDevice {
    #[serde(flatten)]
    pub device: Device,
    pub name: String,
}

/// Everything a run will do, fully resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningPlan {
    pub organization_id: OrganizationId,
    pub network: NetworkSpec,
    pub template: TemplateBinding,
    pub devices: Vec<PlannedDevice>,
}

impl ProvisioningPlan {
    /// Derive device names and check them for collisions.
    pub fn build(request: ProvisioningRequest) -> Result<Self, CoreError> {
        let devices = plan_devices(&request.network.name, request.roster.devices(), request.naming)?;

        Ok(Self {
            organization_id: request.organization_id,
            network: request.network,
            template: request.template,
            devices,
        })
    }

    pub fn serials(&self) -> Vec<Serial> {
        self.devices.iter().map(|d| d.device.serial.clone()).collect()
    }
}

/// Derived names that more than one device would receive, with the serials
/// sharing each, in roster order.
pub fn name_collisions(
    network_name: &str,
    devices: &[Device],
) -> Result<Vec<(String, Vec<Serial>)>, CoreError> {
    let mut by_name: IndexMap<String, Vec<Serial>> = IndexMap::new();
    for device in devices {
        let name = derive_device_name(network_name, &device.model)?;
        by_name.entry(name).or_default().push(device.serial.clone());
    }
    Ok(by_name
        .into_iter()
        .filter(|(_, serials)| serials.len() > 1)
        .collect())
}

fn plan_devices(
    network_name: &str,
    devices: &[Device],
    naming: NamingPolicy,
) -> Result<Vec<PlannedDevice>, CoreError> {
    let collisions = name_collisions(network_name, devices)?;

    if let Some((name, serials)) = collisions.first() {
        if naming == NamingPolicy::Strict {
            return Err(CoreError::NameCollision {
                name: name.clone(),
                serials: serials.iter().map(ToString::to_string).collect(),
            });
        }
        for (name, serials) in &collisions {
            warn!(%name, count = serials.len(), "derived device name collides, adding suffixes");
        }
    }

    // Every exact derived name is reserved up front so a suffixed name can
    // never take one that another device derives exactly.
    let mut taken: HashSet<String> = devices
        .iter()
        .map(|d| derive_device_name(network_name, &d.model))
        .collect::<Result<_, _>>()?;
    let mut first_use: HashSet<String> = HashSet::new();

    devices
        .iter()
        .map(|device| {
            let base = derive_device_name(network_name, &device.model)?;
            let name = if first_use.insert(base.clone()) {
                base
            } else {
                let mut n = 2u32;
                loop {
                    let candidate = format!("{base}_{n}");
                    if taken.insert(candidate.clone()) {
                        break candidate;
                    }
                    n += 1;
                }
            };
            Ok(PlannedDevice {
                device: device.clone(),
                name,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{ProductType, ProductTypes, TimeZone};
    use pretty_assertions::assert_eq;

    fn device(serial: &str, model: &str) -> Device {
        Device::new(Serial::new(serial).unwrap(), model, "1 Main St").unwrap()
    }

    fn request(name: &str, devices: Vec<Device>, naming: NamingPolicy) -> ProvisioningRequest {
        ProvisioningRequest {
            organization_id: OrganizationId::new("952492").unwrap(),
            network: NetworkSpec::new(
                name,
                TimeZone::new("Europe/London").unwrap(),
                ProductTypes::new([ProductType::Appliance]).unwrap(),
            )
            .unwrap(),
            template: TemplateBinding {
                template_id: TemplateId::new("L_706502191543762035").unwrap(),
                auto_bind: false,
            },
            roster: Roster::new(devices).unwrap(),
            naming,
        }
    }

    fn names(plan: &ProvisioningPlan) -> Vec<&str> {
        plan.devices.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn distinct_models_plan_cleanly() {
        let plan = ProvisioningPlan::build(request(
            "testNetwork",
            vec![device("A", "MX64"), device("B", "MS120")],
            NamingPolicy::Strict,
        ))
        .unwrap();
        assert_eq!(names(&plan), vec!["testNetwork_MX64", "testNetwork_MS120"]);
    }

    #[test]
    fn same_type_devices_collide() {
        let roster = vec![device("A", "X"), device("B", "X")];
        let collisions = name_collisions("test", &roster).unwrap();
        assert_eq!(
            collisions,
            vec![(
                "test_X".to_owned(),
                vec![Serial::new("A").unwrap(), Serial::new("B").unwrap()]
            )]
        );
    }

    #[test]
    fn strict_policy_flags_collision() {
        let err = ProvisioningPlan::build(request(
            "test",
            vec![device("A", "X"), device("B", "X")],
            NamingPolicy::Strict,
        ))
        .unwrap_err();

        match err {
            CoreError::NameCollision { name, serials } => {
                assert_eq!(name, "test_X");
                assert_eq!(serials, vec!["A", "B"]);
            }
            other => panic!("expected NameCollision, got {other:?}"),
        }
    }

    #[test]
    fn suffix_policy_disambiguates_in_roster_order() {
        let plan = ProvisioningPlan::build(request(
            "test",
            vec![device("A", "X"), device("B", "X"), device("C", "X")],
            NamingPolicy::Suffix,
        ))
        .unwrap();
        assert_eq!(names(&plan), vec!["test_X", "test_X_2", "test_X_3"]);
    }

    #[test]
    fn suffix_never_steals_an_exact_name() {
        let plan = ProvisioningPlan::build(request(
            "test",
            vec![device("A", "X"), device("B", "X"), device("C", "X_2")],
            NamingPolicy::Suffix,
        ))
        .unwrap();
        assert_eq!(names(&plan), vec!["test_X", "test_X_3", "test_X_2"]);
    }

    #[test]
    fn naming_policy_parses() {
        assert_eq!("suffix".parse::<NamingPolicy>().unwrap(), NamingPolicy::Suffix);
        assert_eq!(NamingPolicy::default().to_string(), "strict");
    }
}
