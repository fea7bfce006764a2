use std::collections::BTreeMap;

use chrono::Utc;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::booking::generate_booking_id;
use crate::models::{
    Booking, BookingRequest, BookingStatus, NewBooking, Payment, PaymentMethod, PaymentStatus,
};
use crate::services::gateway::{OrderRef, OrderRequest};
use crate::state::AppState;

#[derive(Debug)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub order: OrderRef,
}

/// Opens a gateway order, then persists a `(pending, pending)` booking that references it.
///
/// Nothing is persisted unless the gateway order was created. If persistence fails
/// afterwards, the gateway order is left orphaned; it authorizes no funds on its own.
pub async fn create_online_booking(
    state: &AppState,
    request: BookingRequest,
) -> Result<CreatedBooking, AppError> {
    let new = request.validate()?;
    check_references(state, &new)?;

    let gateway = state.gateway.as_deref().ok_or_else(|| {
        tracing::warn!("online booking requested while payments are disabled");
        AppError::GatewayUnavailable
    })?;

    let booking_id = generate_booking_id();
    let mut notes = BTreeMap::new();
    notes.insert("bookingId".to_string(), booking_id.clone());
    notes.insert("customerEmail".to_string(), new.customer.email.clone());
    notes.insert("customerName".to_string(), new.customer.name.clone());

    let order = gateway
        .create_order(OrderRequest {
            amount: new.amount,
            receipt: booking_id.clone(),
            notes,
        })
        .await
        .map_err(|e| {
            tracing::error!(booking_id = %booking_id, error = %e, "gateway order creation failed, booking not created");
            AppError::from(e)
        })?;

    let booking = build_booking(
        new,
        booking_id,
        PaymentMethod::Online,
        Some(order.id.clone()),
        BookingStatus::Pending,
    );

    {
        let db = state.db()?;
        queries::insert_booking(&db, &booking).map_err(|e| {
            tracing::error!(
                booking_id = %booking.booking_id,
                order_id = %order.id,
                error = %e,
                "failed to persist booking, gateway order is orphaned"
            );
            AppError::from(e)
        })?;
    }

    tracing::info!(
        booking_id = %booking.booking_id,
        order_id = %order.id,
        amount = order.amount,
        "created online booking"
    );

    Ok(CreatedBooking { booking, order })
}

/// Persists a `(confirmed, pending)` cash-on-delivery booking. Never touches the gateway.
pub fn create_cod_booking(state: &AppState, request: BookingRequest) -> Result<Booking, AppError> {
    let new = request.validate()?;
    check_references(state, &new)?;

    let booking = build_booking(
        new,
        generate_booking_id(),
        PaymentMethod::Cod,
        None,
        BookingStatus::Confirmed,
    );

    let db = state.db()?;
    queries::insert_booking(&db, &booking)?;

    tracing::info!(booking_id = %booking.booking_id, "created cash-on-delivery booking");
    Ok(booking)
}

/// Admin override of the booking-level status. Payment state is not touched and the
/// result may disagree with it, e.g. `cancelled` with a completed payment.
pub fn override_status(state: &AppState, id: &str, status: &str) -> Result<Booking, AppError> {
    let status = BookingStatus::parse(status.trim()).ok_or_else(|| {
        AppError::Validation(format!(
            "status must be one of: {}",
            BookingStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    let db = state.db()?;
    let booking = queries::update_booking_status(&db, id, status)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    tracing::info!(
        booking_id = %booking.booking_id,
        status = status.as_str(),
        payment_status = booking.payment.status.as_str(),
        "booking status overridden by admin"
    );
    Ok(booking)
}

fn check_references(state: &AppState, new: &NewBooking) -> Result<(), AppError> {
    let db = state.db()?;
    if queries::get_service(&db, &new.service.service_id)?.is_none() {
        return Err(AppError::NotFound(format!(
            "service {} not found",
            new.service.service_id
        )));
    }
    if let Some(location_id) = &new.address.location_id {
        if queries::get_location(&db, location_id)?.is_none() {
            return Err(AppError::NotFound(format!("location {location_id} not found")));
        }
    }
    Ok(())
}

fn build_booking(
    new: NewBooking,
    booking_id: String,
    method: PaymentMethod,
    razorpay_order_id: Option<String>,
    status: BookingStatus,
) -> Booking {
    let now = Utc::now().naive_utc();
    Booking {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id,
        customer: new.customer,
        car: new.car,
        service: new.service,
        schedule: new.schedule,
        address: new.address,
        payment: Payment {
            method,
            razorpay_order_id,
            razorpay_payment_id: None,
            amount: new.amount,
            status: PaymentStatus::Pending,
        },
        status,
        created_at: now,
        updated_at: now,
    }
}
