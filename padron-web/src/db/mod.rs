//! Entity store for padron-web
//!
//! Free async functions over SQLite. Functions that take part in a
//! multi-entity write accept `&mut SqliteConnection` so they run equally on a
//! pooled connection or inside a transaction; read-only listings take the pool.

pub mod beneficiarios;
pub mod catalog;
pub mod domicilios;
pub mod import_cache;
pub mod inscripciones;
pub mod programas;
pub mod usuarios;

/// `%term%` pattern for LIKE searches
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}
