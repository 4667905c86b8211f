use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Validation error: {0}")]
    Validation(anyhow::Error),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Invalid transition: cannot {operation} {entity_id} while {current}")]
    InvalidTransition {
        entity_id: Uuid,
        operation: &'static str,
        current: String,
    },

    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    #[error("Estimate {estimate_id} has already been converted to an invoice")]
    ConversionConflict { estimate_id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Transient error: {0}")]
    Transient(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::ValidationError(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Validation(err) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), None)
            }
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::InvalidTransition {
                entity_id,
                operation,
                ref current,
            } => (
                StatusCode::CONFLICT,
                format!("Cannot {} {} in status '{}'", operation, entity_id, current),
                Some(format!("current_status={}", current)),
            ),
            AppError::CurrencyMismatch { expected, found } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Currency mismatch: expected {}, found {}", expected, found),
                None,
            ),
            AppError::ConversionConflict { estimate_id } => (
                StatusCode::CONFLICT,
                format!(
                    "Estimate {} has already been converted to an invoice",
                    estimate_id
                ),
                None,
            ),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), None),
            AppError::Transient(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporarily unable to complete the operation".to_string(),
                Some(err.to_string()),
            ),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
