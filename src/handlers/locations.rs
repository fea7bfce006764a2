use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::{check_auth, parse_body};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::LocationInput;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("location not found".to_string())
}

// GET /api/locations
#[derive(Deserialize)]
pub struct LocationsQuery {
    pub is_active: Option<bool>,
}

pub async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let locations = {
        let db = state.db()?;
        queries::list_locations(&db, query.is_active)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "count": locations.len(),
        "locations": locations,
    })))
}

// GET /api/locations/:id
pub async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let location = {
        let db = state.db()?;
        queries::get_location(&db, &id)?
    }
    .ok_or_else(not_found)?;

    Ok(Json(serde_json::json!({ "success": true, "location": location })))
}

// POST /api/locations
pub async fn create_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LocationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let input = parse_body(body)?.validate()?;

    let location = {
        let db = state.db()?;
        queries::insert_location(&db, &input)?
    };
    tracing::info!(location_id = %location.id, city = %location.city, "location created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "location": location })),
    ))
}

// PUT /api/locations/:id
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<LocationInput>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let input = parse_body(body)?.validate()?;

    let location = {
        let db = state.db()?;
        queries::update_location(&db, &id, &input)?
    }
    .ok_or_else(not_found)?;

    Ok(Json(serde_json::json!({ "success": true, "location": location })))
}

// DELETE /api/locations/:id
pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db()?;
        queries::delete_location(&db, &id)?
    };
    if !deleted {
        return Err(not_found());
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Location deleted successfully",
    })))
}
