// Request and response bodies for the Dashboard API endpoints used during
// provisioning. Field names follow the API's camelCase wire format.

use serde::{Deserialize, Serialize};

// ── Error envelope ───────────────────────────────────────────────────

/// Body the Dashboard API returns on 4xx/5xx: `{"errors": ["..."]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

// ── Networks ─────────────────────────────────────────────────────────

/// `POST /organizations/{organizationId}/networks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNetworkRequest {
    pub name: String,
    pub product_types: Vec<String>,
    pub time_zone: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product_types: Vec<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_bound_to_config_template: bool,
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /networks/{networkId}/bind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindNetworkRequest {
    pub config_template_id: String,
    pub auto_bind: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

/// `POST /networks/{networkId}/devices/claim`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimDevicesRequest {
    pub serials: Vec<String>,
}

/// `PUT /devices/{serial}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    pub name: String,
    pub address: String,
    /// Ask the service to geocode `address` and move the map marker there.
    pub move_map_marker: bool,
}

/// Device record returned by `GET`/`PUT /devices/{serial}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
}
