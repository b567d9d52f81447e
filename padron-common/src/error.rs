//! Common error types for padron

use thiserror::Error;

use crate::validation::FieldErrors;

/// Common result type for padron operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across padron services
#[derive(Error, Debug)]
pub enum Error {
    /// Field-level validation failure, including uniqueness conflicts
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation refused because other records depend on the target
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Single-field validation error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(FieldErrors::single(field, message))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Unique constraints and the field error each one surfaces as.
///
/// SQLite reports `UNIQUE constraint failed: <table>.<col>[, ...]`; matching
/// on the last column of each constraint is enough to tell them apart.
const UNIQUE_CONSTRAINT_FIELDS: &[(&str, &str, &str)] = &[
    (
        "inscripciones.periodo",
        "periodo",
        "Ya existe una inscripcion de este beneficiario para el periodo seleccionado.",
    ),
    (
        "beneficiarios.folio_tarjeta",
        "folio_tarjeta",
        "Este folio ya esta registrado.",
    ),
    ("beneficiarios.curp", "curp", "La CURP ya esta registrada."),
    ("programas.slug", "slug", "El slug ya esta en uso."),
];

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = db_err.message();
                if let Some((_, field, text)) = UNIQUE_CONSTRAINT_FIELDS
                    .iter()
                    .find(|(constraint, _, _)| message.contains(constraint))
                {
                    return Error::field(*field, *text);
                }
            }
            if db_err.is_foreign_key_violation() {
                return Error::Conflict(
                    "El registro tiene registros relacionados y no puede modificarse.".to_string(),
                );
            }
        }
        Error::Database(err)
    }
}
