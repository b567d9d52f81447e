//! Dashboard aggregation
//!
//! Read-only queries over the beneficiary and enrollment tables. Nothing here
//! takes locks or writes, so dashboards may be served concurrently and may
//! lag a write that lands mid-request.

pub mod beneficiarios;
pub mod filters;
pub mod inscripciones;
pub mod mis_registros;
pub mod series;

/// Row cap for high-cardinality breakdowns and recent-activity excerpts
pub const TOP_N: i64 = 10;
