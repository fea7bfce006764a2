use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db()?;
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(serde_json::json!({ "success": true, "stats": stats })))
}
