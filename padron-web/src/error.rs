//! Error types for padron-web
//!
//! Every handler returns [`ApiResult`]. Validation failures become 422 with
//! per-field messages and are never logged as failures; everything else is
//! logged here before a sanitized body goes out.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use padron_common::FieldErrors;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::ocr_client::OcrError;

const VALIDATION_MESSAGE: &str = "Los datos proporcionados no son validos.";
const INTERNAL_MESSAGE: &str = "Ocurrio un error interno, intenta nuevamente.";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No acting user could be identified (401)
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Acting user lacks the required role (403)
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Field-level validation failure (422)
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Internal server error (500); the message is safe to show and has
    /// already been logged with its cause
    #[error("Internal server error: {0}")]
    Internal(String),

    /// OCR upstream failure
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// padron-common error
    #[error("Common error: {0}")]
    Common(#[from] padron_common::Error),
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => validation_response(errors),
            ApiError::Unauthenticated => error_response(
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Se requiere un usuario autenticado.".to_string(),
            ),
            ApiError::Forbidden => error_response(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "No tienes permiso para realizar esta accion.".to_string(),
            ),
            ApiError::NotFound(msg) => {
                warn!(message = %msg, "Resource not found");
                error_response(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
            }
            ApiError::Conflict(msg) => {
                warn!(message = %msg, "Request conflicts with existing records");
                error_response(StatusCode::CONFLICT, "CONFLICT", msg)
            }
            ApiError::Internal(msg) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Ocr(err) => {
                let status =
                    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(err.body())).into_response()
            }
            ApiError::Common(err) => common_response(err),
        }
    }
}

fn common_response(err: padron_common::Error) -> Response {
    use padron_common::Error;

    match err {
        Error::Validation(errors) => validation_response(errors),
        Error::NotFound(msg) => ApiError::NotFound(msg).into_response(),
        Error::Conflict(msg) => ApiError::Conflict(msg).into_response(),
        Error::InvalidInput(msg) => {
            warn!(message = %msg, "Invalid input");
            error_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
        }
        other => {
            error!(error = %other, "Request failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

fn validation_response(errors: FieldErrors) -> Response {
    let body = Json(json!({
        "message": VALIDATION_MESSAGE,
        "errors": errors,
    }));
    (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
}

fn error_response(status: StatusCode, error_code: &str, message: String) -> Response {
    let body = Json(json!({
        "error_code": error_code,
        "message": message,
    }));
    (status, body).into_response()
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
