// ── Device domain types ──

use serde::Serialize;
use std::collections::HashSet;

use super::ids::Serial;
use crate::error::CoreError;

/// One roster entry: a pre-registered piece of hardware to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub serial: Serial,
    /// Hardware model, e.g. `MX64`. Becomes the suffix of the device name.
    pub model: String,
    /// Street address the device is installed at.
    pub address: String,
}

impl Device {
    pub fn new(
        serial: Serial,
        model: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let model = model.into().trim().to_owned();
        let address = address.into().trim().to_owned();

        if model.is_empty() || model.chars().any(char::is_whitespace) {
            return Err(CoreError::validation(
                format!("model for device {serial}"),
                "must be a non-empty model name without spaces",
            ));
        }
        if address.is_empty() {
            return Err(CoreError::validation(
                format!("address for device {serial}"),
                "must not be empty",
            ));
        }

        Ok(Self {
            serial,
            model,
            address,
        })
    }
}

/// Ordered list of devices to provision in one run.
///
/// Non-empty, and each serial appears once: a serial can only be claimed
/// into one network per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster(Vec<Device>);

impl Roster {
    pub fn new(devices: Vec<Device>) -> Result<Self, CoreError> {
        if devices.is_empty() {
            return Err(CoreError::validation("roster", "at least one device is required"));
        }

        let mut seen = HashSet::new();
        for device in &devices {
            if !seen.insert(&device.serial) {
                return Err(CoreError::validation(
                    "roster",
                    format!("serial {} is listed more than once", device.serial),
                ));
            }
        }

        Ok(Self(devices))
    }

    pub fn devices(&self) -> &[Device] {
        &self.0
    }

    pub fn serials(&self) -> Vec<Serial> {
        self.0.iter().map(|d| d.serial.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Display name for a device: `<network_name>_<device_type>`.
pub fn derive_device_name(network_name: &str, device_type: &str) -> Result<String, CoreError> {
    if network_name.is_empty() {
        return Err(CoreError::validation("network name", "must not be empty"));
    }
    if device_type.is_empty() {
        return Err(CoreError::validation("device type", "must not be empty"));
    }
    Ok(format!("{network_name}_{device_type}"))
}
