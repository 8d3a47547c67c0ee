//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use sha2::Sha256;
use tower::ServiceExt;

type HmacSha256 = Hmac<Sha256>;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> axum::Router {
    let store = InMemoryOrderStore::new();
    let config = api::config::Config::default();
    let (state, _stock, _catalog) = api::create_default_state(store, &config).await;
    api::create_app(state, get_metrics_handle())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn checkout_body(payment_mode: &str, quantity: u32) -> String {
    serde_json::json!({
        "guest": {
            "name": "Asha Rao",
            "email": "asha@example.com",
            "phone": "9876543210"
        },
        "items": [{ "product_id": "SKU-001", "quantity": quantity }],
        "address": {
            "name": "Asha Rao",
            "line1": "12 MG Road",
            "line2": null,
            "city": "Bengaluru",
            "state": "Karnataka",
            "pincode": "560001",
            "phone": "9876543210"
        },
        "payment_mode": payment_mode
    })
    .to_string()
}

async fn place_order(app: &axum::Router, payment_mode: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/checkout")
                .header("content-type", "application/json")
                .body(Body::from(checkout_body(payment_mode, 1)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn razorpay_webhook(order_id: &str, txn: &str, event: &str) -> (String, String) {
    let body = serde_json::json!({
        "event": event,
        "payload": {
            "payment": {
                "entity": {
                    "id": txn,
                    "amount": 49900,
                    "status": if event == "payment.captured" { "captured" } else { "failed" },
                    "method": "upi",
                    "notes": { "order_id": order_id }
                }
            }
        }
    })
    .to_string();

    let mut mac = HmacSha256::new_from_slice(b"dev-webhook-secret").unwrap();
    mac.update(body.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    (body, signature)
}

async fn post_webhook(
    app: &axum::Router,
    gateway: &str,
    body: String,
    signature: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/webhooks/{gateway}"))
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-razorpay-signature", signature);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn guest_checkout_creates_pending_order() {
    let app = setup().await;
    let json = place_order(&app, "online").await;

    assert_eq!(json["status"], "Pending");
    assert_eq!(json["payment_status"], "pending");
    assert_eq!(json["is_guest"], true);
    assert_eq!(json["final_price_paise"], 49900);
    assert_eq!(json["status_history"].as_array().unwrap().len(), 1);
    assert!(json["order_id"].as_str().unwrap().starts_with("ORD-"));
}

#[tokio::test]
async fn cod_checkout_is_processing_immediately() {
    let app = setup().await;
    let json = place_order(&app, "cod").await;

    assert_eq!(json["status"], "Processing");
    assert_ne!(json["payment_status"], "pending");
}

#[tokio::test]
async fn checkout_requires_exactly_one_customer_form() {
    let app = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/checkout")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "items": [{ "product_id": "SKU-001", "quantity": 1 }],
                        "address": {
                            "name": "A", "line1": "B", "line2": null, "city": "C",
                            "state": "D", "pincode": "560001", "phone": "9876543210"
                        },
                        "payment_mode": "online"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_order_is_conflict() {
    let app = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/checkout")
                .header("content-type", "application/json")
                .body(Body::from(checkout_body("online", 10_000)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("SKU-001"));
}

#[tokio::test]
async fn razorpay_webhook_confirms_payment() {
    let app = setup().await;
    let order = place_order(&app, "online").await;
    let order_id = order["order_id"].as_str().unwrap();

    let (body, signature) = razorpay_webhook(order_id, "pay_1", "payment.captured");
    let response = post_webhook(&app, "razorpay", body, Some(&signature)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ack"], "applied");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["status"], "Processing");
    assert_eq!(json["payment_status"], "paid");
    assert_eq!(json["payment_ref"]["transaction_id"], "pay_1");
}

#[tokio::test]
async fn replayed_webhook_is_acknowledged_as_duplicate() {
    let app = setup().await;
    let order = place_order(&app, "online").await;
    let order_id = order["order_id"].as_str().unwrap();

    let (body, signature) = razorpay_webhook(order_id, "pay_1", "payment.captured");
    let first = post_webhook(&app, "razorpay", body.clone(), Some(&signature)).await;
    assert_eq!(body_json(first).await["ack"], "applied");

    let second = post_webhook(&app, "razorpay", body, Some(&signature)).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await["ack"], "duplicate");

    // Still exactly one Processing entry in the trail.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let history = body_json(response).await["status_history"].clone();
    let processing = history
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["status"] == "Processing")
        .count();
    assert_eq!(processing, 1);
}

#[tokio::test]
async fn failed_payment_webhook_cancels_the_order() {
    let app = setup().await;
    let order = place_order(&app, "online").await;
    let order_id = order["order_id"].as_str().unwrap();

    let (body, signature) = razorpay_webhook(order_id, "pay_bad", "payment.failed");
    let response = post_webhook(&app, "razorpay", body, Some(&signature)).await;
    assert_eq!(body_json(response).await["ack"], "applied");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["status"], "Cancelled");
    assert_eq!(json["payment_status"], "failed");
}

#[tokio::test]
async fn bad_signature_is_unauthorized_and_mutates_nothing() {
    let app = setup().await;
    let order = place_order(&app, "online").await;
    let order_id = order["order_id"].as_str().unwrap();

    let (body, _) = razorpay_webhook(order_id, "pay_1", "payment.captured");
    let response = post_webhook(&app, "razorpay", body, Some("00ff00ff")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["payment_status"], "pending");
}

#[tokio::test]
async fn webhook_for_unknown_order_is_dropped_with_200() {
    let app = setup().await;

    let (body, signature) = razorpay_webhook("ORD-999999", "pay_ghost", "payment.captured");
    let response = post_webhook(&app, "razorpay", body, Some(&signature)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ack"], "dropped");
}

fn phonepe_webhook(order_id: &str, txn: &str, code: &str) -> (String, String) {
    use base64::Engine;
    use sha2::Digest;

    let status = serde_json::json!({
        "success": code == "PAYMENT_SUCCESS",
        "code": code,
        "message": "test",
        "data": {
            "merchantTransactionId": order_id,
            "transactionId": txn,
            "amount": 49900,
            "state": "COMPLETED"
        }
    });
    let encoded = base64::engine::general_purpose::STANDARD.encode(status.to_string());

    let mut hasher = sha2::Sha256::new();
    hasher.update(encoded.as_bytes());
    hasher.update(b"/pg/v1/status");
    hasher.update(b"dev-salt");
    let x_verify = format!("{:x}###1", hasher.finalize());

    let body = serde_json::json!({ "response": encoded }).to_string();
    (body, x_verify)
}

#[tokio::test]
async fn phonepe_webhook_confirms_payment() {
    let app = setup().await;
    let order = place_order(&app, "online").await;
    let order_id = order["order_id"].as_str().unwrap();

    let (body, x_verify) = phonepe_webhook(order_id, "T2407221659", "PAYMENT_SUCCESS");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/phonepe")
                .header("content-type", "application/json")
                .header("x-verify", x_verify)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ack"], "applied");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["payment_ref"]["gateway"], "phonepe");
    assert_eq!(json["status"], "Processing");
}

#[tokio::test]
async fn unknown_gateway_is_not_found() {
    let app = setup().await;
    let response = post_webhook(&app, "paypal", "{}".to_string(), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ship_and_deliver_flow() {
    let app = setup().await;
    let order = place_order(&app, "cod").await;
    let order_id = order["order_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/ship"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "carrier": "manual" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ship = body_json(response).await;
    let tracking = ship["tracking_id"].as_str().unwrap().to_string();
    assert!(tracking.starts_with("MAN-"));

    // Shipping again returns the same tracking id.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/ship"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "carrier": "manual" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["tracking_id"], tracking.as_str());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/deliver"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Delivered");
}

#[tokio::test]
async fn cancel_command_and_404s() {
    let app = setup().await;
    let order = place_order(&app, "online").await;
    let order_id = order["order_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/cancel"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "reason": "changed mind" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "Cancelled");

    // Direct commands on unknown orders are 404, unlike webhooks.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders/ORD-999999/cancel")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({ "reason": "x" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/orders/ORD-999999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = setup().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
