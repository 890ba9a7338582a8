#![allow(clippy::unwrap_used)]
// End-to-end provisioning tests against a wiremock Dashboard.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meraprov_core::{
    CoreError, Dashboard, DashboardConfig, Device, FailureKind, NamingPolicy, NetworkId,
    NetworkSpec, OrganizationId, ProductType, ProductTypes, Provisioner, ProvisioningRequest,
    ProvisioningPlan, RetryPolicy, Roster, RunState, Serial, Stage, StepStatus, TemplateBinding, TemplateId,
    TimeZone,
};

const ORG: &str = "952492";
const NET: &str = "L_646829496481105433";
const TEMPLATE: &str = "L_706502191543762035";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let mut config = DashboardConfig::new(SecretString::from("test-api-key".to_owned()));
    config.base_url = server.uri();
    config.timeout = Duration::from_secs(5);
    config.retry = RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    };
    let dashboard = Dashboard::new(&config).unwrap();
    (server, dashboard)
}

fn org() -> OrganizationId {
    OrganizationId::new(ORG).unwrap()
}

fn net() -> NetworkId {
    NetworkId::new(NET).unwrap()
}

fn serial(raw: &str) -> Serial {
    Serial::new(raw).unwrap()
}

fn spec(name: &str) -> NetworkSpec {
    NetworkSpec::new(
        name,
        TimeZone::new("Europe/London").unwrap(),
        ProductTypes::new([ProductType::Appliance, ProductType::Switch]).unwrap(),
    )
    .unwrap()
}

fn request(name: &str, devices: &[(&str, &str)], naming: NamingPolicy) -> ProvisioningRequest {
    let roster = devices
        .iter()
        .map(|(sn, model)| Device::new(serial(sn), *model, "1 Main St, Glasgow").unwrap())
        .collect();
    ProvisioningRequest {
        organization_id: org(),
        network: spec(name),
        template: TemplateBinding {
            template_id: TemplateId::new(TEMPLATE).unwrap(),
            auto_bind: false,
        },
        roster: Roster::new(roster).unwrap(),
        naming,
    }
}

async fn mount_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/organizations/{ORG}/networks")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": NET,
            "organizationId": ORG,
            "name": "testNetwork",
            "productTypes": ["appliance", "switch"],
            "timeZone": "Europe/London"
        })))
        .mount(server)
        .await;
}

async fn mount_claim_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/devices/claim")))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn mount_update_ok(server: &MockServer) {
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serial": "ANY",
            "lat": 55.76,
            "lng": -4.17
        })))
        .mount(server)
        .await;
}

async fn mount_bind_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/bind")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

fn rejection(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({ "errors": [message] }))
}

// ── Step tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_bind_matching_template() {
    let (server, dashboard) = setup().await;
    mount_create(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/bind")))
        .and(body_json(json!({ "configTemplateId": TEMPLATE, "autoBind": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let id = dashboard.create_network(&org(), &spec("testNetwork")).await.unwrap();
    assert_eq!(id, net());

    dashboard
        .bind_template(&id, &TemplateId::new(TEMPLATE).unwrap(), false)
        .await
        .unwrap();
}

#[tokio::test]
async fn bind_with_mismatched_product_types_is_client_error() {
    let (server, dashboard) = setup().await;
    mount_create(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/bind")))
        .respond_with(rejection(
            "The network's product types must match those of the template",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let id = dashboard.create_network(&org(), &spec("testNetwork")).await.unwrap();
    let err = dashboard
        .bind_template(&id, &TemplateId::new(TEMPLATE).unwrap(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::IncompatibleProductTypes { .. }), "{err:?}");
    assert_eq!(err.kind(), FailureKind::Client);
}

#[tokio::test]
async fn duplicate_network_name() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/organizations/{ORG}/networks")))
        .respond_with(rejection("Name has already been taken"))
        .expect(1)
        .mount(&server)
        .await;

    let err = dashboard
        .create_network(&org(), &spec("testNetwork"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName { ref name } if name == "testNetwork"));
}

#[tokio::test]
async fn create_response_with_only_an_id_is_accepted() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/organizations/{ORG}/networks")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": NET })))
        .expect(1)
        .mount(&server)
        .await;

    let id = dashboard
        .create_network(&org(), &spec("testNetwork"))
        .await
        .unwrap();
    assert_eq!(id, net());
}

#[tokio::test]
async fn empty_network_id_is_decode_error() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "", "name": "x" })))
        .mount(&server)
        .await;

    let err = dashboard
        .create_network(&org(), &spec("testNetwork"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);
}

#[tokio::test]
async fn second_claim_of_same_serial_conflicts() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/devices/claim")))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/devices/claim")))
        .respond_with(rejection(
            "Device with serial Q2BN-TXYH-KJLU is already claimed",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sn = serial("Q2BN-TXYH-KJLU");
    dashboard.claim_device(&net(), &sn).await.unwrap();
    let err = dashboard.claim_device(&net(), &sn).await.unwrap_err();

    assert!(matches!(err, CoreError::AlreadyClaimed { ref serial } if serial == "Q2BN-TXYH-KJLU"));
}

#[tokio::test]
async fn claim_outcomes_follow_input_order() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "serials": ["BBBB"] })))
        .respond_with(rejection("Invalid serial"))
        .mount(&server)
        .await;
    mount_claim_ok(&server).await;

    let outcomes = dashboard
        .claim_devices(&net(), &[serial("AAAA"), serial("BBBB"), serial("CCCC")])
        .await
        .unwrap();

    let serials: Vec<&str> = outcomes.iter().map(|o| o.serial.as_str()).collect();
    assert_eq!(serials, vec!["AAAA", "BBBB", "CCCC"]);
    assert!(outcomes[0].status.is_success());
    assert!(matches!(
        outcomes[1].status.error(),
        Some(CoreError::UnknownSerial { .. })
    ));
    assert!(outcomes[2].status.is_success());
}

#[tokio::test]
async fn claiming_nothing_is_rejected_locally() {
    let (server, dashboard) = setup().await;
    let err = dashboard.claim_devices(&net(), &[]).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_device_is_idempotent() {
    let (server, dashboard) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/Q2BN-TXYH-KJLU"))
        .and(header("X-Cisco-Meraki-API-Key", "test-api-key"))
        .and(body_json(json!({
            "name": "testNetwork_MX64",
            "address": "28 Avondale Grove",
            "moveMapMarker": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serial": "Q2BN-TXYH-KJLU",
            "name": "testNetwork_MX64",
            "address": "28 Avondale Grove"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let sn = serial("Q2BN-TXYH-KJLU");
    for _ in 0..2 {
        dashboard
            .update_device(&sn, "testNetwork_MX64", "28 Avondale Grove")
            .await
            .unwrap();
    }
}

// ── Retry ───────────────────────────────────────────────────────────

#[tokio::test]
async fn service_error_then_success_is_retried() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_create(&server).await;

    let id = dashboard.create_network(&org(), &spec("testNetwork")).await.unwrap();
    assert_eq!(id, net());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn client_error_is_attempted_once() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .respond_with(rejection("Time zone is invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let err = dashboard
        .create_network(&org(), &spec("testNetwork"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Client);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unauthorized_is_auth_kind_and_not_retried() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "errors": ["Invalid API key"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = dashboard
        .create_network(&org(), &spec("testNetwork"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Auth);
}

// ── Orchestrated runs ───────────────────────────────────────────────

#[tokio::test]
async fn full_run_reaches_done() {
    let (server, dashboard) = setup().await;
    mount_create(&server).await;
    mount_claim_ok(&server).await;
    mount_update_ok(&server).await;
    mount_bind_ok(&server).await;

    let provisioner = Provisioner::new(dashboard);
    let states = provisioner.subscribe();
    let report = provisioner
        .run(request(
            "testNetwork",
            &[("Q2BN-TXYH-KJLU", "MX64"), ("Q2HP-AAAA-BBBB", "MS120")],
            NamingPolicy::Strict,
        ))
        .await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.network_id, Some(net()));
    assert!(report.stages.iter().all(|s| s.status.is_success()));
    assert_eq!(report.claims.len(), 2);
    let names: Vec<_> = report
        .updates
        .iter()
        .map(|o| o.name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["testNetwork_MX64", "testNetwork_MS120"]);
    assert!(matches!(*states.borrow(), RunState::Done));
    assert!(report.finished_at.is_some());
}

#[tokio::test]
async fn prebuilt_plan_runs_with_bare_acknowledgements() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/organizations/{ORG}/networks")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": NET })))
        .mount(&server)
        .await;
    mount_claim_ok(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/Q2BN-TXYH-KJLU"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/bind")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let plan = ProvisioningPlan::build(request(
        "testNetwork",
        &[("Q2BN-TXYH-KJLU", "MX64")],
        NamingPolicy::Strict,
    ))
    .unwrap();
    let provisioner = Provisioner::new(dashboard);
    let report = provisioner.execute(&plan).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.network_id, Some(net()));
    assert!(report.status(Stage::Validation).is_success());
    assert!(report.status(Stage::DevicesUpdated).is_success());
    assert!(matches!(provisioner.state(), RunState::Done));
}

#[tokio::test]
async fn failure_at_claim_keeps_network_progress() {
    let (server, dashboard) = setup().await;
    mount_create(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/devices/claim")))
        .respond_with(rejection("Device is already claimed by another network"))
        .mount(&server)
        .await;

    let provisioner = Provisioner::new(dashboard);
    let report = provisioner
        .run(request(
            "testNetwork",
            &[("Q2BN-TXYH-KJLU", "MX64")],
            NamingPolicy::Strict,
        ))
        .await;

    assert!(!report.is_success());
    assert_eq!(report.network_id, Some(net()));
    assert!(report.status(Stage::NetworkCreated).is_success());
    assert!(matches!(
        report.status(Stage::DevicesClaimed),
        StepStatus::Failed(CoreError::DeviceFailures { .. })
    ));
    assert!(matches!(
        report.status(Stage::DevicesUpdated),
        StepStatus::NotAttempted
    ));
    assert!(matches!(
        report.status(Stage::TemplateBound),
        StepStatus::NotAttempted
    ));

    let (stage, cause) = report.failure().unwrap();
    assert_eq!(stage, Stage::DevicesClaimed);
    assert_eq!(cause.kind(), FailureKind::Client);
    assert!(matches!(provisioner.state(), RunState::Failed { .. }));
}

#[tokio::test]
async fn failed_update_halts_before_binding() {
    let (server, dashboard) = setup().await;
    mount_create(&server).await;
    mount_claim_ok(&server).await;
    Mock::given(method("PUT"))
        .respond_with(rejection("Address could not be geocoded"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/networks/{NET}/bind")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = Provisioner::new(dashboard)
        .run(request(
            "testNetwork",
            &[("Q2BN-TXYH-KJLU", "MX64")],
            NamingPolicy::Strict,
        ))
        .await;

    let (stage, _) = report.failure().unwrap();
    assert_eq!(stage, Stage::DevicesUpdated);
    assert!(matches!(
        report.updates[0].status.error(),
        Some(CoreError::AddressUnparseable { .. })
    ));
}

#[tokio::test]
async fn strict_collision_fails_validation_without_requests() {
    let (server, dashboard) = setup().await;

    let report = Provisioner::new(dashboard)
        .run(request("test", &[("A", "X"), ("B", "X")], NamingPolicy::Strict))
        .await;

    let (stage, cause) = report.failure().unwrap();
    assert_eq!(stage, Stage::Validation);
    match cause {
        CoreError::NameCollision { name, serials } => {
            assert_eq!(name, "test_X");
            assert_eq!(serials, &vec!["A".to_owned(), "B".to_owned()]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(report.network_id.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}
