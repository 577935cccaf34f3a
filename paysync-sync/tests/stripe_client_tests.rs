mod common;

use common::{object, remote};
use paysync_sync::{RemoteApi, RemoteError, StripeClient, StripeConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> StripeClient {
    StripeClient::new(StripeConfig {
        api_base_url: server.uri(),
        ..StripeConfig::new("sk_test_123")
    })
}

// ── Config ───────────────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = StripeConfig::default();
    assert_eq!(cfg.api_base_url, "https://api.stripe.com");
    assert_eq!(cfg.timeout_secs, 30);
    assert!(cfg.api_key.is_empty());
}

#[test]
fn config_serde_roundtrip() {
    let cfg = StripeConfig::new("sk_live_abc");
    let json = serde_json::to_string(&cfg).unwrap();
    let back: StripeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.api_key, "sk_live_abc");
    assert!(!back.is_test_key());
}

// ── Requests ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_posts_form_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/customers"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(body_string_contains("name=Acme+Inc"))
        .and(body_string_contains("email=ops%40acme.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_123",
            "object": "customer",
            "name": "Acme Inc",
            "email": "ops@acme.test"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = object(json!({"name": "Acme Inc", "email": "ops@acme.test"}));
    let resource = client(&server).create("customers", &payload).await.unwrap();
    assert_eq!(resource.id.as_str(), "cus_123");
    assert_eq!(resource.get_str("object"), Some("customer"));
}

#[tokio::test]
async fn update_posts_to_resource_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/products/prod_1"))
        .and(body_string_contains("active=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "prod_1", "active": false})))
        .expect(1)
        .mount(&server)
        .await;

    let resource = client(&server)
        .update("products", &remote("prod_1"), &object(json!({"active": false})))
        .await
        .unwrap();
    assert_eq!(resource.object["active"], json!(false));
}

#[tokio::test]
async fn retrieve_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/prices/price_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "price_1", "unit_amount": 1200})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/products/prod_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "prod_1", "deleted": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let price = client.retrieve("prices", &remote("price_1")).await.unwrap();
    assert_eq!(price.object["unit_amount"], json!(1200));
    client.delete("products", &remote("prod_1")).await.unwrap();
}

#[tokio::test]
async fn nested_values_are_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .create("customers", &object(json!({"address": {"city": "Oslo"}})))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::UnsupportedValue { property } if property == "address"));
}

// ── Errors ───────────────────────────────────────────────────────

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "invalid_request_error", "message": "No such customer: 'cus_missing'"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).retrieve("customers", &remote("cus_missing")).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        RemoteError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such customer: 'cus_missing'");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn plain_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).create("customers", &object(json!({"name": "x"}))).await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 502, ref message } if message == "bad gateway"));
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client(&server).create("customers", &object(json!({"name": "x"}))).await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn response_without_id_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "customer"})))
        .mount(&server)
        .await;

    let err = client(&server).create("customers", &object(json!({"name": "x"}))).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = StripeClient::new(StripeConfig {
        api_base_url: "http://127.0.0.1:1".to_string(),
        ..StripeConfig::new("sk_test_123")
    });
    let err = client.retrieve("customers", &remote("cus_1")).await.unwrap_err();
    assert!(matches!(err, RemoteError::Network(_)));
}
