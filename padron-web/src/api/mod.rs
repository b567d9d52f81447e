//! HTTP API handlers for padron-web

pub mod auth;
pub mod beneficiarios;
pub mod dashboard;
pub mod health;
pub mod import_cache;
pub mod inscripciones;
pub mod ocr;
pub mod programas;
pub mod secciones;

pub use auth::{actor_middleware, Actor};
pub use health::health_routes;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use padron_common::FieldErrors;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;

const BODY_FIELD: &str = "body";
const TARGET_TYPE_PREFIX: &str = "into the target type: ";

/// Success body for form-style writes: a status message alongside the entity
#[derive(Debug, Serialize)]
pub struct Flash<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Flash<T> {
    pub fn new(status: &'static str, data: T) -> Self {
        Self { status, data }
    }
}

/// Unwrap a JSON request body.
///
/// A body that does not deserialize is reported like any other validation
/// failure: on the offending field when the deserializer names it, otherwise
/// on `body`.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    let rejection = match payload {
        Ok(Json(value)) => return Ok(value),
        Err(rejection) => rejection,
    };

    let text = rejection.body_text();
    debug!(rejection = %text, "Rejected JSON body");

    let errors = match &rejection {
        JsonRejection::JsonDataError(_) => match rejected_field(&text) {
            Some(field) => FieldErrors::single(
                field,
                format!("El campo {field} tiene un tipo de dato invalido."),
            ),
            None => FieldErrors::single(BODY_FIELD, "El cuerpo de la solicitud no es valido."),
        },
        _ => FieldErrors::single(BODY_FIELD, "El cuerpo de la solicitud debe ser JSON valido."),
    };
    Err(errors.into())
}

/// Field path from a data-error message such as
/// `... into the target type: programa_id: invalid type: ...`
fn rejected_field(text: &str) -> Option<&str> {
    let (_, detail) = text.split_once(TARGET_TYPE_PREFIX)?;
    let (path, _) = detail.split_once(": ")?;
    let valid = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    valid.then_some(path)
}
