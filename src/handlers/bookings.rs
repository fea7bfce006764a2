use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::{check_auth, parse_body};
use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::{BookingRequest, BookingStatus};
use crate::services::booking;
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let request = parse_body(body)?;
    let created = booking::create_online_booking(&state, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Booking created successfully",
            "booking": created.booking,
            "order": {
                "id": created.order.id,
                "amount": created.order.amount,
                "currency": created.order.currency,
            },
        })),
    ))
}

// POST /api/bookings/cod
pub async fn create_cod_booking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let request = parse_body(body)?;
    let booking = booking::create_cod_booking(&state, request)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Booking confirmed successfully. Pay cash on delivery.",
            "booking": booking,
        })),
    ))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown booking status: {s}")))?,
        ),
        None => None,
    };
    let filter = BookingFilter {
        status,
        created_from: parse_bound(query.start_date.as_deref(), false)?,
        created_to: parse_bound(query.end_date.as_deref(), true)?,
    };

    let bookings = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

/// Accepts `YYYY-MM-DD` (start or end of that day) or an RFC 3339 timestamp.
fn parse_bound(value: Option<&str>, end_of_day: bool) -> Result<Option<NaiveDateTime>, AppError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let bound = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        return Ok(bound);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| Some(dt.naive_utc()))
        .map_err(|_| AppError::Validation(format!("invalid date: {value}")))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db()?;
        queries::get_booking_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    Ok(Json(serde_json::json!({ "success": true, "booking": booking })))
}

// PUT /api/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let request = parse_body(body)?;

    let booking = booking::override_status(&state, &id, &request.status)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Booking status updated successfully",
        "booking": booking,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound(None, false).unwrap(), None);
        assert_eq!(parse_bound(Some(""), true).unwrap(), None);

        let start = parse_bound(Some("2025-06-01"), false).unwrap().unwrap();
        assert_eq!(start.to_string(), "2025-06-01 00:00:00");
        let end = parse_bound(Some("2025-06-01"), true).unwrap().unwrap();
        assert_eq!(end.to_string(), "2025-06-01 23:59:59");

        let ts = parse_bound(Some("2025-06-01T10:00:00+05:30"), false).unwrap().unwrap();
        assert_eq!(ts.to_string(), "2025-06-01 04:30:00");

        assert!(parse_bound(Some("June 1"), false).is_err());
    }
}
