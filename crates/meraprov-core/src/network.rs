// ── Network creation ──

use meraprov_api::types::CreateNetworkRequest;
use tracing::{debug, info};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::model::{NetworkId, NetworkSpec, OrganizationId};

impl Dashboard {
    /// Create a network under `organization_id` and return the identifier
    /// the service assigned to it.
    pub async fn create_network(
        &self,
        organization_id: &OrganizationId,
        spec: &NetworkSpec,
    ) -> Result<NetworkId, CoreError> {
        let body = CreateNetworkRequest {
            name: spec.name.clone(),
            product_types: spec.product_types.to_wire(),
            time_zone: spec.time_zone.to_string(),
            tags: spec.tags.clone(),
            notes: spec.notes.clone(),
        };
        debug!(org = %organization_id, name = %spec.name, "creating network");

        let (client, org, body) = (&self.client, organization_id.as_str(), &body);
        let response = self
            .retry
            .run("create network", move || client.create_network(org, body))
            .await
            .map_err(|e| classify(e, spec))?;

        let network_id = NetworkId::new(&response.id).map_err(|_| CoreError::Decode {
            message: format!("network created without a usable id: {:?}", response.id),
        })?;

        info!(network_id = %network_id, name = %spec.name, "network created");
        Ok(network_id)
    }
}

fn classify(err: meraprov_api::Error, spec: &NetworkSpec) -> CoreError {
    if err.status() == Some(400)
        && (err.message_contains("already been taken") || err.message_contains("already exists"))
    {
        return CoreError::DuplicateName {
            name: spec.name.clone(),
        };
    }
    CoreError::from(err)
}
