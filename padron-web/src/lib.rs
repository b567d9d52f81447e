//! padron-web library - beneficiary registration service
//!
//! JSON API over the beneficiary register: enrollment capture, program
//! administration, dashboards, an OCR proxy for voter ID photos and a staging
//! cache for bulk imports.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod error;
pub mod kpi;
pub mod pagination;
pub mod services;

use services::ocr_client::OcrClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// OCR service client (immutable after startup)
    pub ocr: Arc<OcrClient>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, ocr: OcrClient) -> Self {
        Self {
            db,
            ocr: Arc::new(ocr),
        }
    }
}

/// Build application router
///
/// Every route except `/health` runs behind the actor middleware; role
/// checks happen in the handlers.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{get, post, put};
    use tower_http::trace::TraceLayer;

    let protected = Router::new()
        .route("/api/secciones/:seccional", get(api::secciones::show))
        // Enrollment capture and listing
        .route("/inscripciones", post(api::inscripciones::store))
        .route("/inscripciones/create", get(api::inscripciones::create_context))
        .route("/inscripciones/lista", get(api::inscripciones::lista))
        .route("/inscripciones/kpis", get(api::inscripciones::kpis))
        .route(
            "/inscripciones/:id",
            put(api::inscripciones::update).delete(api::inscripciones::destroy),
        )
        // Program administration
        .route(
            "/programas",
            get(api::programas::index).post(api::programas::create),
        )
        .route(
            "/programas/:id",
            put(api::programas::update).delete(api::programas::destroy),
        )
        // Beneficiaries
        .route("/mis-registros", get(api::beneficiarios::index))
        .route(
            "/mis-registros/:id",
            get(api::beneficiarios::show).put(api::beneficiarios::update),
        )
        .route("/beneficiarios/:id", axum::routing::delete(api::beneficiarios::destroy))
        // Dashboards
        .route("/admin/kpis", get(api::dashboard::admin_kpis))
        .route("/admin/filtros", get(api::dashboard::admin_filters))
        .route("/capturista/kpis", get(api::dashboard::capturista_kpis))
        // Integrations
        .route(
            "/api/ocr/ine/extract",
            post(api::ocr::extract).layer(DefaultBodyLimit::max(api::ocr::MAX_BODY_BYTES)),
        )
        .route("/api/beneficiarios/cache", post(api::import_cache::store))
        .route("/api/beneficiarios/cache/:key", get(api::import_cache::show))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::actor_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
