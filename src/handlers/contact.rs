use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::parse_body;
use crate::errors::AppError;
use crate::models::ContactMessage;
use crate::services::contact;
use crate::state::AppState;

// POST /api/contact
pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContactMessage>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let message = parse_body(body)?;
    contact::send_contact_message(&state, message).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Thank you for contacting us! We will get back to you soon.",
    })))
}
