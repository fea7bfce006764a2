pub mod razorpay;

use std::collections::BTreeMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    Unavailable,

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("gateway request failed (status {status:?}): {body}")]
    RequestFailed { status: Option<u16>, body: String },
}

/// What the caller wants the gateway to reserve. `amount` is in major currency units.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub amount: f64,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// A gateway order as reported back by the gateway. `amount` is in subunits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRef {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: OrderRequest) -> Result<OrderRef, GatewayError>;

    /// Must return `false` rather than fail on any internal error.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// Converts a major-unit amount (e.g. 499.00) into gateway subunits (49900).
pub fn to_subunits(amount: f64) -> Result<i64, GatewayError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(GatewayError::InvalidAmount(amount));
    }
    let subunits = (amount * 100.0).round();
    if subunits < 1.0 || subunits > i64::MAX as f64 {
        return Err(GatewayError::InvalidAmount(amount));
    }
    Ok(subunits as i64)
}

/// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"` under `secret`.
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    match sign(secret, order_id, payment_id) {
        Some(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
        None => false,
    }
}
