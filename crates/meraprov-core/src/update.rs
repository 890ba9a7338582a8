// ── Device updates ──

use futures_util::stream::{self, StreamExt};
use meraprov_api::types::UpdateDeviceRequest;
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::model::Serial;
use crate::plan::PlannedDevice;
use crate::report::{DeviceOutcome, StepStatus};

impl Dashboard {
    /// Set a device's display name and street address, and move its map
    /// marker to the geocoded address.
    ///
    /// Repeating the call with the same arguments leaves the device in the
    /// same state and succeeds.
    pub async fn update_device(&self, serial: &Serial, name: &str, address: &str) -> Result<(), CoreError> {
        let body = UpdateDeviceRequest {
            name: name.to_owned(),
            address: address.to_owned(),
            move_map_marker: true,
        };
        let (client, sn, body) = (&self.client, serial.as_str(), &body);
        debug!(%serial, name, "updating device");

        let device = self
            .retry
            .run("update device", move || client.update_device(sn, body))
            .await
            .map_err(|e| classify(e, serial, name, address))?;

        let (lat, lng) = device.map_or((None, None), |d| (d.lat, d.lng));
        info!(%serial, name, lat, lng, "device updated");
        Ok(())
    }

    /// Apply every planned name and address, returning one outcome per
    /// device in plan order.
    pub async fn update_devices(&self, devices: &[PlannedDevice]) -> Vec<DeviceOutcome> {
        stream::iter(devices)
            .map(|planned| async move {
                let serial = &planned.device.serial;
                let result = self
                    .update_device(serial, &planned.name, &planned.device.address)
                    .await;
                if let Err(ref e) = result {
                    warn!(%serial, error = %e, "update failed");
                }
                DeviceOutcome {
                    serial: serial.clone(),
                    name: Some(planned.name.clone()),
                    status: StepStatus::from_result(result),
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

fn classify(err: meraprov_api::Error, serial: &Serial, name: &str, address: &str) -> CoreError {
    if err.is_not_found() {
        return CoreError::DeviceNotFound {
            serial: serial.to_string(),
        };
    }
    if err.status() == Some(400) {
        if err.message_contains("geocod") || err.message_contains("address") {
            return CoreError::AddressUnparseable {
                serial: serial.to_string(),
                address: address.to_owned(),
            };
        }
        if err.message_contains("name")
            && ["taken", "in use", "already"]
                .iter()
                .any(|n| err.message_contains(n))
        {
            return CoreError::NameCollision {
                name: name.to_owned(),
                serials: vec![serial.to_string()],
            };
        }
    }
    CoreError::from(err)
}
