//! Beneficiary dashboards

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use padron_common::db::{Municipio, Usuario};
use padron_common::time::now;
use serde::Serialize;

use crate::api::auth::{Actor, ADMIN_ONLY, CAPTURISTA_ONLY};
use crate::db::{catalog, usuarios};
use crate::error::ApiResult;
use crate::kpi::beneficiarios::{self as kpi, AdminKpis, CapturistaKpis};
use crate::kpi::filters::{BeneficiarioFilter, KpiQuery};
use crate::AppState;

/// GET /admin/kpis
pub async fn admin_kpis(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<KpiQuery>,
) -> ApiResult<Json<AdminKpis>> {
    actor.require(ADMIN_ONLY)?;
    let filter = BeneficiarioFilter::from_query(&query)?;
    Ok(Json(kpi::admin_kpis(&state.db, &filter, now()).await?))
}

/// GET /capturista/kpis
pub async fn capturista_kpis(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<KpiQuery>,
) -> ApiResult<Json<CapturistaKpis>> {
    actor.require(CAPTURISTA_ONLY)?;
    let filter = BeneficiarioFilter::own_records(&actor.uuid, &query)?;
    Ok(Json(kpi::capturista_kpis(&state.db, &filter, now()).await?))
}

/// Dropdown options for the admin dashboard
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub municipios: Vec<Municipio>,
    pub capturistas: Vec<Usuario>,
}

/// GET /admin/filtros
pub async fn admin_filters(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<FilterOptions>> {
    actor.require(ADMIN_ONLY)?;
    Ok(Json(FilterOptions {
        municipios: catalog::list_municipios(&state.db).await?,
        capturistas: usuarios::list_capturistas(&state.db).await?,
    }))
}
