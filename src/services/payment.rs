use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::queries::{self, PaymentTransition};
use crate::errors::AppError;
use crate::services::gateway::{to_subunits, OrderRef, OrderRequest};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: Option<f64>,
    pub booking_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

/// Fields the hosted checkout hands back to the client after a successful payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFailureReport {
    pub booking_id: Option<String>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentConfirmation {
    pub payment_id: String,
    /// True only when this call moved a booking to `(confirmed, completed)`.
    pub booking_updated: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Opens a gateway order for an existing booking reference; the receipt is the booking id.
pub async fn create_payment_order(
    state: &AppState,
    request: CreateOrderRequest,
) -> Result<OrderRef, AppError> {
    let (amount, booking_id) = match (request.amount, present(&request.booking_id)) {
        (Some(amount), Some(booking_id)) if amount != 0.0 => (amount, booking_id.to_string()),
        _ => {
            return Err(AppError::Validation(
                "amount and booking id are required".to_string(),
            ))
        }
    };

    to_subunits(amount)?;
    let gateway = state.gateway.as_deref().ok_or(AppError::GatewayUnavailable)?;

    let mut notes = BTreeMap::new();
    notes.insert("bookingId".to_string(), booking_id.clone());
    notes.insert(
        "customerEmail".to_string(),
        present(&request.customer_email).unwrap_or_default().to_string(),
    );
    notes.insert(
        "customerName".to_string(),
        present(&request.customer_name).unwrap_or_default().to_string(),
    );

    let order = gateway
        .create_order(OrderRequest {
            amount,
            receipt: booking_id.clone(),
            notes,
        })
        .await
        .map_err(|e| {
            tracing::error!(booking_id = %booking_id, error = %e, "payment order creation failed");
            AppError::from(e)
        })?;

    Ok(order)
}

/// The trust boundary: a client-reported payment becomes durable state only after the
/// gateway signature checks out.
pub fn confirm_payment(
    state: &AppState,
    request: &VerifyPaymentRequest,
) -> Result<PaymentConfirmation, AppError> {
    let (Some(order_id), Some(payment_id), Some(_)) = (
        present(&request.razorpay_order_id),
        present(&request.razorpay_payment_id),
        present(&request.razorpay_signature),
    ) else {
        return Err(AppError::MissingVerificationParameters);
    };
    // Compared exactly as supplied.
    let signature = request.razorpay_signature.as_deref().unwrap_or_default();

    let verified = match state.gateway.as_deref() {
        Some(gateway) => gateway.verify_signature(order_id, payment_id, signature),
        None => {
            tracing::warn!(order_id = %order_id, "payment verification attempted while payments are disabled");
            false
        }
    };
    if !verified {
        tracing::warn!(order_id = %order_id, payment_id = %payment_id, "invalid payment signature");
        return Err(AppError::InvalidSignature);
    }

    let booking_updated = match present(&request.booking_id) {
        Some(booking_id) => {
            let db = state.db()?;
            match queries::mark_payment_completed(&db, booking_id, payment_id)? {
                PaymentTransition::Applied => {
                    tracing::info!(booking_id = %booking_id, payment_id = %payment_id, "payment confirmed");
                    true
                }
                PaymentTransition::AlreadyCompleted => {
                    tracing::info!(booking_id = %booking_id, payment_id = %payment_id, "payment already confirmed, nothing to do");
                    false
                }
                PaymentTransition::BookingClosed => {
                    tracing::warn!(booking_id = %booking_id, payment_id = %payment_id, "verified payment for closed booking, status left unchanged");
                    false
                }
                PaymentTransition::NotFound => {
                    tracing::warn!(booking_id = %booking_id, payment_id = %payment_id, "verified payment for unknown booking");
                    false
                }
            }
        }
        None => {
            tracing::info!(order_id = %order_id, payment_id = %payment_id, "payment verified without booking reference");
            false
        }
    };

    Ok(PaymentConfirmation {
        payment_id: payment_id.to_string(),
        booking_updated,
    })
}

/// Client-reported failure: `(cancelled, failed)`, except that a completed payment stays completed
/// and a closed booking stays closed.
pub fn record_payment_failure(
    state: &AppState,
    report: &PaymentFailureReport,
) -> Result<(), AppError> {
    let Some(booking_id) = present(&report.booking_id) else {
        tracing::info!(error = ?report.error, "payment failure reported without booking reference");
        return Ok(());
    };

    let db = state.db()?;
    match queries::mark_payment_failed(&db, booking_id)? {
        PaymentTransition::Applied => {
            tracing::info!(booking_id = %booking_id, error = ?report.error, "payment failure recorded");
        }
        PaymentTransition::AlreadyCompleted => {
            tracing::warn!(booking_id = %booking_id, error = ?report.error, "ignoring failure report for completed payment");
        }
        PaymentTransition::BookingClosed => {
            tracing::warn!(booking_id = %booking_id, error = ?report.error, "ignoring failure report for closed booking");
        }
        PaymentTransition::NotFound => {
            tracing::warn!(booking_id = %booking_id, "payment failure reported for unknown booking");
        }
    }
    Ok(())
}
