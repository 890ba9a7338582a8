// ── Template binding ──

use meraprov_api::types::BindNetworkRequest;
use tracing::{debug, info};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::model::{NetworkId, TemplateId};

impl Dashboard {
    /// Bind a network to a configuration template.
    ///
    /// With `auto_bind` false the template is only associated; its settings
    /// are not pushed onto the network's existing configuration.
    pub async fn bind_template(
        &self,
        network_id: &NetworkId,
        template_id: &TemplateId,
        auto_bind: bool,
    ) -> Result<(), CoreError> {
        let body = BindNetworkRequest {
            config_template_id: template_id.to_string(),
            auto_bind,
        };
        let (client, net, body) = (&self.client, network_id.as_str(), &body);
        debug!(%network_id, %template_id, auto_bind, "binding template");

        self.retry
            .run("bind template", move || client.bind_network(net, body))
            .await
            .map_err(|e| classify(e, network_id, template_id))?;

        info!(%network_id, %template_id, "template bound");
        Ok(())
    }
}

fn classify(err: meraprov_api::Error, network_id: &NetworkId, template_id: &TemplateId) -> CoreError {
    if err.is_not_found() {
        return if err.message_contains("network") && !err.message_contains("template") {
            CoreError::NetworkNotFound {
                network_id: network_id.to_string(),
            }
        } else {
            CoreError::TemplateNotFound {
                template_id: template_id.to_string(),
            }
        };
    }
    if err.status() == Some(400) {
        if err.message_contains("already bound") {
            return CoreError::AlreadyBound {
                network_id: network_id.to_string(),
            };
        }
        if err.message_contains("product type") || err.message_contains("incompatible") {
            return CoreError::IncompatibleProductTypes {
                network_id: network_id.to_string(),
                template_id: template_id.to_string(),
                message: err.messages().join("; "),
            };
        }
    }
    CoreError::from(err)
}
