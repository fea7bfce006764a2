use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::{check_auth, parse_body};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::ServiceInput;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("service not found".to_string())
}

// GET /api/services
#[derive(Deserialize)]
pub struct ServicesQuery {
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let services = {
        let db = state.db()?;
        queries::list_services(&db, category, query.is_active)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "count": services.len(),
        "services": services,
    })))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = {
        let db = state.db()?;
        queries::get_service(&db, &id)?
    }
    .ok_or_else(not_found)?;

    Ok(Json(serde_json::json!({ "success": true, "service": service })))
}

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ServiceInput>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let input = parse_body(body)?.validate()?;

    let service = {
        let db = state.db()?;
        queries::insert_service(&db, &input)?
    };
    tracing::info!(service_id = %service.id, name = %service.name, "service created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "service": service })),
    ))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ServiceInput>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let input = parse_body(body)?.validate()?;

    let service = {
        let db = state.db()?;
        queries::update_service(&db, &id, &input)?
    }
    .ok_or_else(not_found)?;

    Ok(Json(serde_json::json!({ "success": true, "service": service })))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db()?;
        queries::delete_service(&db, &id)?
    };
    if !deleted {
        return Err(not_found());
    }
    tracing::info!(service_id = %id, "service deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Service deleted successfully",
    })))
}
