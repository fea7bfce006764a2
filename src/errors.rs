use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("missing payment verification parameters")]
    MissingVerificationParameters,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("payments are disabled: gateway credentials are not configured")]
    GatewayUnavailable,

    #[error("payment gateway request failed: {0}")]
    GatewayRequestFailed(String),

    #[error("invalid payment signature")]
    InvalidSignature,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("notification error: {0}")]
    Notification(String),

    #[error("notifications are disabled: email relay is not configured")]
    NotificationsDisabled,

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(rusqlite::Error::SqliteFailure(code, msg)) = err.downcast_ref::<rusqlite::Error>() {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                let detail = msg.clone().unwrap_or_else(|| "duplicate key".to_string());
                return AppError::Conflict(detail);
            }
        }
        AppError::Internal(err)
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable => AppError::GatewayUnavailable,
            GatewayError::InvalidAmount(amount) => {
                AppError::Validation(format!("amount must be a positive value, got {amount}"))
            }
            GatewayError::RequestFailed { .. } => AppError::GatewayRequestFailed(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingVerificationParameters => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GatewayRequestFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidSignature => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Notification(_) => StatusCode::BAD_GATEWAY,
            AppError::NotificationsDisabled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Upstream and internal diagnostics stay in the logs.
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                "internal server error".to_string()
            }
            AppError::GatewayRequestFailed(detail) => {
                tracing::error!(detail = %detail, "payment gateway request failed");
                "failed to create payment order".to_string()
            }
            AppError::Notification(detail) => {
                tracing::error!(detail = %detail, "notification delivery failed");
                "failed to send message, please try again later".to_string()
            }
            AppError::Conflict(detail) => {
                tracing::warn!(detail = %detail, "persistence conflict");
                "resource already exists".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_becomes_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();

        let app_err = AppError::from(anyhow::Error::from(err));
        assert!(matches!(app_err, AppError::Conflict(_)));
    }

    #[test]
    fn other_database_errors_are_internal() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing_table", []).unwrap_err();

        let app_err = AppError::from(anyhow::Error::from(err));
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::MissingVerificationParameters, StatusCode::BAD_REQUEST),
            (AppError::InvalidSignature, StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::GatewayUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (AppError::GatewayRequestFailed("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
