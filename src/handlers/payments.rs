use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::parse_body;
use crate::errors::AppError;
use crate::services::payment::{
    self, CreateOrderRequest, PaymentFailureReport, VerifyPaymentRequest,
};
use crate::state::AppState;

// POST /api/payments/create-order
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = parse_body(body)?;
    let order = payment::create_payment_order(&state, request).await?;

    Ok(Json(serde_json::json!({ "success": true, "order": order })))
}

// POST /api/payments/verify
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = parse_body(body)?;
    let confirmation = payment::confirm_payment(&state, &request)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Payment verified successfully",
        "payment_id": confirmation.payment_id,
    })))
}

// POST /api/payments/failure
pub async fn payment_failure(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PaymentFailureReport>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let report = parse_body(body)?;
    payment::record_payment_failure(&state, &report)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Payment failure recorded",
    })))
}
