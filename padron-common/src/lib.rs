//! # Padron Common Library
//!
//! Shared code for the padron services including:
//! - Database bootstrap, migrations and entity models
//! - Common error type with storage constraint translation
//! - Field-level validation errors and input validators
//! - Configuration loading
//! - Reporting time windows

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use validation::FieldErrors;
