#![allow(clippy::unwrap_used)]
// End-to-end lifecycle runs against a wiremock controller.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hnv_core::{
    ClientConfig, CoreError, FieldValue, Lifecycle, Model, ResourceKind, ResourcePath,
    WaitOptions,
};

const LN_ENDPOINT: &str = "/networking/v1/logicalNetworks/ln1";

async fn setup() -> (MockServer, Lifecycle<hnv_api::HnvClient>) {
    let server = MockServer::start().await;
    let mut config = ClientConfig::new(server.uri().parse().unwrap())
        .with_credentials("admin", SecretString::from("secret".to_owned()));
    config.retry_interval = Duration::from_millis(10);
    let lifecycle = Lifecycle::connect(&config).unwrap();
    (server, lifecycle)
}

fn logical_network(state: &str) -> Value {
    json!({
        "resourceRef": "/logicalNetworks/ln1",
        "resourceId": "ln1",
        "etag": "W/\"7\"",
        "properties": {
            "provisioningState": state,
            "networkVirtualizationEnabled": true,
            "subnets": [{
                "resourceId": "sub1",
                "properties": {
                    "provisioningState": state,
                    "addressPrefix": "10.0.0.0/24",
                    "vlanID": 100,
                    "ipPools": [{
                        "resourceId": "pool1",
                        "properties": {
                            "startIpAddress": "10.0.0.100",
                            "endIpAddress": "10.0.0.200"
                        }
                    }]
                }
            }]
        }
    })
}

#[tokio::test]
async fn commit_then_poll_until_succeeded() {
    let (server, lifecycle) = setup().await;

    Mock::given(method("PUT"))
        .and(path(LN_ENDPOINT))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logical_network("Updating")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(logical_network("Updating")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(logical_network("Succeeded")))
        .mount(&server)
        .await;

    let mut ln = Model::new(ResourceKind::LogicalNetwork)
        .with("resource_id", "ln1")
        .unwrap()
        .with("network_virtualization_enabled", true)
        .unwrap();

    lifecycle
        .commit(&mut ln, WaitOptions::timeout(Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(ln.is_finalized());
    assert_eq!(ln.etag(), Some("W/\"7\""));

    let subnet = &ln.get("subnets").and_then(FieldValue::as_models).unwrap()[0];
    let pool = &subnet.get("ip_pools").and_then(FieldValue::as_models).unwrap()[0];
    assert_eq!(
        pool.resource_path(),
        ResourcePath::id("pool1")
            .with_parent("sub1")
            .with_grandparent("ln1")
    );

    // Fetched children are addressable on their own.
    assert_eq!(
        ResourceKind::IpPool.endpoint(&pool.resource_path()).unwrap(),
        "/networking/v1/logicalNetworks/ln1/logicalSubnets/sub1/ipPools/pool1"
    );
}

#[tokio::test]
async fn edit_fetched_resource_and_commit() {
    let (server, lifecycle) = setup().await;

    Mock::given(method("GET"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(logical_network("Succeeded")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = lifecycle
        .get(ResourceKind::LogicalNetwork, &ResourcePath::id("ln1"))
        .await
        .unwrap();
    let mut edited = fetched.clone();

    assert!(matches!(
        edited.set("network_virtualization_enabled", false),
        Err(CoreError::Finalized { .. })
    ));
    edited.thaw();
    edited.set("network_virtualization_enabled", false).unwrap();
    assert_ne!(edited, fetched);

    lifecycle
        .commit(&mut edited, WaitOptions::no_wait())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["properties"]["networkVirtualizationEnabled"], false);
    assert!(body["properties"].get("provisioningState").is_none());
    assert!(body["properties"]["subnets"][0].get("parentResourceID").is_none());
}

#[tokio::test]
async fn remove_waits_for_not_found() {
    let (server, lifecycle) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(logical_network("Deleting")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    lifecycle
        .remove(
            ResourceKind::LogicalNetwork,
            &ResourcePath::id("ln1"),
            WaitOptions::timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    let gets = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn controller_failure_surfaces_as_service_error() {
    let (server, lifecycle) = setup().await;

    Mock::given(method("PUT"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(logical_network("Failed")))
        .mount(&server)
        .await;

    let mut ln = Model::new(ResourceKind::LogicalNetwork)
        .with("resource_id", "ln1")
        .unwrap();
    let err = lifecycle
        .commit(&mut ln, WaitOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Service { .. }));
    assert!(!ln.is_finalized());
}

#[test]
fn connect_rejects_zero_retry_interval() {
    let mut config = ClientConfig::new("http://127.0.0.1:8080".parse().unwrap());
    config.retry_interval = Duration::ZERO;
    assert!(matches!(
        Lifecycle::connect(&config),
        Err(CoreError::Config { .. })
    ));
}

#[tokio::test]
async fn rejected_credentials_map_to_authentication_error() {
    let (server, lifecycle) = setup().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Access denied"})),
        )
        .mount(&server)
        .await;

    let err = lifecycle
        .get(ResourceKind::LogicalNetwork, &ResourcePath::id("ln1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { ref message } if message == "Access denied"));
}
