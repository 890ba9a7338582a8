#![allow(clippy::unwrap_used)]
// Integration tests for `DashboardClient` using wiremock.

use pretty_assertions::assert_eq;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meraprov_api::types::{BindNetworkRequest, CreateNetworkRequest, UpdateDeviceRequest};
use meraprov_api::{API_KEY_HEADER, DashboardClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DashboardClient) {
    let server = MockServer::start().await;
    let key = SecretString::from("test-api-key".to_owned());
    let client =
        DashboardClient::from_api_key(&server.uri(), &key, &TransportConfig::default()).unwrap();
    (server, client)
}

fn create_body() -> CreateNetworkRequest {
    CreateNetworkRequest {
        name: "testNetwork".into(),
        product_types: vec!["appliance".into(), "switch".into(), "wireless".into()],
        time_zone: "Europe/London".into(),
        tags: Vec::new(),
        notes: None,
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_create_network_sends_headers_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/952492/networks"))
        .and(header(API_KEY_HEADER, "test-api-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "name": "testNetwork",
            "productTypes": ["appliance", "switch", "wireless"],
            "timeZone": "Europe/London"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "L_646829496481105433",
            "organizationId": "952492",
            "name": "testNetwork",
            "productTypes": ["appliance", "switch", "wireless"],
            "timeZone": "Europe/London",
            "tags": [],
            "isBoundToConfigTemplate": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let network = client.create_network("952492", &create_body()).await.unwrap();

    assert_eq!(network.id, "L_646829496481105433");
    assert_eq!(network.organization_id.as_deref(), Some("952492"));
    assert_eq!(network.product_types.len(), 3);
}

#[tokio::test]
async fn test_claim_accepts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/networks/N_1/devices/claim"))
        .and(body_json(json!({ "serials": ["Q2BN-TXYH-KJLU"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .claim_devices("N_1", &["Q2BN-TXYH-KJLU".to_owned()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_device() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/Q2BN-TXYH-KJLU"))
        .and(body_json(json!({
            "name": "testNetwork_MX64",
            "address": "1 Main St",
            "moveMapMarker": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serial": "Q2BN-TXYH-KJLU",
            "name": "testNetwork_MX64",
            "model": "MX64",
            "address": "1 Main St",
            "lat": 37.4180951010362,
            "lng": -122.098531723022,
            "networkId": "N_1"
        })))
        .mount(&server)
        .await;

    let device = client
        .update_device(
            "Q2BN-TXYH-KJLU",
            &UpdateDeviceRequest {
                name: "testNetwork_MX64".into(),
                address: "1 Main St".into(),
                move_map_marker: true,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(device.name.as_deref(), Some("testNetwork_MX64"));
    assert_eq!(device.network_id.as_deref(), Some("N_1"));
    assert!(device.lat.is_some());
}

#[tokio::test]
async fn test_update_device_accepts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/Q2BN-TXYH-KJLU"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let device = client
        .update_device(
            "Q2BN-TXYH-KJLU",
            &UpdateDeviceRequest {
                name: "testNetwork_MX64".into(),
                address: "1 Main St".into(),
                move_map_marker: true,
            },
        )
        .await
        .unwrap();

    assert!(device.is_none());
}

#[tokio::test]
async fn test_create_network_needs_only_an_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/952492/networks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "N_1" })))
        .mount(&server)
        .await;

    let network = client.create_network("952492", &create_body()).await.unwrap();

    assert_eq!(network.id, "N_1");
    assert!(network.name.is_none());
}

#[tokio::test]
async fn test_bind_network_sends_explicit_auto_bind() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/networks/N_1/bind"))
        .and(body_json(json!({
            "configTemplateId": "L_706502191543762035",
            "autoBind": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "N_1" })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .bind_network(
            "N_1",
            &BindNetworkRequest {
                config_template_id: "L_706502191543762035".into(),
                auto_bind: false,
            },
        )
        .await
        .unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "errors": ["Invalid API key"] })),
        )
        .mount(&server)
        .await;

    let result = client.get_device("Q2BN-TXYH-KJLU").await;

    match result {
        Err(Error::Authentication { status, ref message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_error_keeps_service_messages() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/952492/networks"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["Name has already been taken"]
        })))
        .mount(&server)
        .await;

    let err = client
        .create_network("952492", &create_body())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err.message_contains("already been taken"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_not_found_with_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/NOPE-NOPE-NOPE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get_device("NOPE-NOPE-NOPE").await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client
        .claim_devices("N_1", &["A".to_owned()])
        .await
        .unwrap_err();

    match err {
        Error::Service {
            status,
            ref message,
        } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        ref other => panic!("expected Service error, got: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = client.get_device("A").await.unwrap_err();
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(7)));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/952492/networks"))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client
        .create_network("952492", &create_body())
        .await
        .unwrap_err();

    match err {
        Error::Deserialization { ref body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop a server so the port is closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let key = SecretString::from("k".to_owned());
    let client = DashboardClient::from_api_key(&uri, &key, &TransportConfig::default()).unwrap();

    let err = client
        .send::<serde_json::Value, ()>(Method::GET, "/organizations", None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/A"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "serial": "A" }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let timeout = std::time::Duration::from_secs(1);
    let http = reqwest::Client::builder().timeout(timeout).build().unwrap();
    let client = DashboardClient::from_reqwest(&server.uri(), http, timeout).unwrap();

    let err = client.get_device("A").await.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout_secs: 1 }),
        "got {err:?}"
    );
}
