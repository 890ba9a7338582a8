// ── Device claiming ──
//
// One claim request per serial, so every serial gets its own outcome. The
// stage fans out over the roster with a bounded, ordered buffer: results come
// back in roster order regardless of completion order.

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::model::{NetworkId, Serial};
use crate::report::{DeviceOutcome, StepStatus};

impl Dashboard {
    /// Claim a single serial into a network.
    ///
    /// A serial that is already claimed (by this network or any other) is a
    /// conflict and is never retried.
    pub async fn claim_device(&self, network_id: &NetworkId, serial: &Serial) -> Result<(), CoreError> {
        let serials = [serial.to_string()];
        let (client, net, serials) = (&self.client, network_id.as_str(), &serials[..]);
        debug!(%network_id, %serial, "claiming device");

        self.retry
            .run("claim device", move || client.claim_devices(net, serials))
            .await
            .map_err(|e| classify(e, network_id, serial))?;

        info!(%network_id, %serial, "device claimed");
        Ok(())
    }

    /// Claim every serial into a network, returning one outcome per serial in
    /// input order.
    pub async fn claim_devices(
        &self,
        network_id: &NetworkId,
        serials: &[Serial],
    ) -> Result<Vec<DeviceOutcome>, CoreError> {
        if serials.is_empty() {
            return Err(CoreError::validation("serials", "at least one serial is required"));
        }

        let outcomes = stream::iter(serials)
            .map(|serial| async move {
                let result = self.claim_device(network_id, serial).await;
                if let Err(ref e) = result {
                    warn!(%serial, error = %e, "claim failed");
                }
                DeviceOutcome {
                    serial: serial.clone(),
                    name: None,
                    status: StepStatus::from_result(result),
                }
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(outcomes)
    }
}

fn classify(err: meraprov_api::Error, network_id: &NetworkId, serial: &Serial) -> CoreError {
    if err.is_not_found() {
        return CoreError::NetworkNotFound {
            network_id: network_id.to_string(),
        };
    }
    if err.status().is_some_and(|s| (400..500).contains(&s)) {
        if ["already claimed", "already in", "claimed by", "already been claimed"]
            .iter()
            .any(|n| err.message_contains(n))
        {
            return CoreError::AlreadyClaimed {
                serial: serial.to_string(),
            };
        }
        if ["not found", "invalid serial", "not in inventory", "does not exist"]
            .iter()
            .any(|n| err.message_contains(n))
        {
            return CoreError::UnknownSerial {
                serial: serial.to_string(),
            };
        }
    }
    CoreError::from(err)
}
