use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use carservice::services::gateway::razorpay::RazorpayGateway;
use carservice::services::gateway::{GatewayError, OrderRequest, PaymentGateway};

type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn orders_ok(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    captured.lock().unwrap().push((auth, body.clone()));
    Json(json!({
        "id": "order_N1",
        "entity": "order",
        "amount": body["amount"],
        "currency": body["currency"],
        "receipt": body["receipt"],
        "status": "created"
    }))
}

fn gateway(api_url: String, timeout: Duration) -> RazorpayGateway {
    RazorpayGateway::new(
        "rzp_test_key".to_string(),
        "rzp_secret".to_string(),
        api_url,
        "INR".to_string(),
        timeout,
    )
    .unwrap()
}

fn order_request(amount: f64) -> OrderRequest {
    let mut notes = BTreeMap::new();
    notes.insert("bookingId".to_string(), "BKTEST0001".to_string());
    OrderRequest {
        amount,
        receipt: "BKTEST0001".to_string(),
        notes,
    }
}

#[tokio::test]
async fn test_create_order_sends_subunits_with_basic_auth() {
    let captured: Captured = Arc::new(Mutex::new(vec![]));
    let router = Router::new()
        .route("/v1/orders", post(orders_ok))
        .with_state(Arc::clone(&captured));
    let base = spawn(router).await;

    let gw = gateway(format!("{base}/v1/"), Duration::from_secs(5));
    let order = gw.create_order(order_request(499.0)).await.unwrap();

    assert_eq!(order.id, "order_N1");
    assert_eq!(order.amount, 49900);
    assert_eq!(order.currency, "INR");
    assert_eq!(order.receipt, "BKTEST0001");

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (auth, body) = &captured[0];
    assert_eq!(
        auth.as_deref(),
        Some("Basic cnpwX3Rlc3Rfa2V5OnJ6cF9zZWNyZXQ=")
    );
    assert_eq!(body["amount"], 49900);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["receipt"], "BKTEST0001");
    assert_eq!(body["notes"]["bookingId"], "BKTEST0001");
}

#[tokio::test]
async fn test_create_order_passes_gateway_error_through() {
    let router = Router::new().route(
        "/orders",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"code": "BAD_REQUEST_ERROR", "description": "amount too low"}})),
            )
        }),
    );
    let base = spawn(router).await;

    let err = gateway(base, Duration::from_secs(5))
        .create_order(order_request(0.5))
        .await
        .unwrap_err();
    match err {
        GatewayError::RequestFailed { status, body } => {
            assert_eq!(status, Some(400));
            assert!(body.contains("amount too low"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_order_times_out() {
    let router = Router::new().route(
        "/orders",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let base = spawn(router).await;

    let err = gateway(base, Duration::from_millis(100))
        .create_order(order_request(499.0))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::RequestFailed { status: None, .. }));
}

#[tokio::test]
async fn test_invalid_amount_never_reaches_gateway() {
    let captured: Captured = Arc::new(Mutex::new(vec![]));
    let router = Router::new()
        .route("/orders", post(orders_ok))
        .with_state(Arc::clone(&captured));
    let base = spawn(router).await;

    let err = gateway(base, Duration::from_secs(5))
        .create_order(order_request(-10.0))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidAmount(_)));
    assert!(captured.lock().unwrap().is_empty());
}

#[test]
fn test_verify_signature_uses_key_secret() {
    let gw = gateway("http://127.0.0.1:1".to_string(), Duration::from_secs(1));
    let signature = carservice::services::gateway::sign("rzp_secret", "order_N1", "pay_N1").unwrap();

    assert!(gw.verify_signature("order_N1", "pay_N1", &signature));
    assert!(!gw.verify_signature("order_N1", "pay_N2", &signature));
    assert!(!gw.verify_signature("order_N1", "pay_N1", ""));
}
