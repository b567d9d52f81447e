//! Enrollment endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use padron_common::db::{Estatus, Inscripcion, Municipio, Programa};
use padron_common::time::now;
use padron_common::validation::non_blank;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::api::auth::{Actor, ANY_ROLE, STAFF};
use crate::api::{json_body, Flash};
use crate::db::inscripciones::{self, InscripcionListFilter, InscripcionListItem};
use crate::db::{catalog, programas};
use crate::error::{ApiError, ApiResult};
use crate::kpi::filters::{InscripcionFilter, KpiQuery};
use crate::kpi::inscripciones::{self as kpi, InscripcionKpis};
use crate::pagination::Page;
use crate::services::enrollment::{self, CuotaDiaria, InscripcionRequest, InscripcionUpdateRequest};
use crate::AppState;

const REGISTER_FAILED: &str = "No se pudo registrar la inscripcion, intenta nuevamente.";

/// Everything the capture form needs
#[derive(Debug, Serialize)]
pub struct FormContext {
    pub programas: Vec<Programa>,
    pub municipios: Vec<Municipio>,
    pub periodo: String,
    /// Present for program clerks only
    pub cuota: Option<CuotaDiaria>,
}

/// GET /inscripciones/create
pub async fn create_context(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<FormContext>> {
    actor.require(ANY_ROLE)?;
    let now = now();

    Ok(Json(FormContext {
        programas: programas::list_activos(&state.db).await?,
        municipios: catalog::list_municipios(&state.db).await?,
        periodo: enrollment::current_periodo(now),
        cuota: enrollment::daily_quota(&state.db, &actor.uuid, actor.role, now).await?,
    }))
}

/// POST /inscripciones
///
/// Validation failures come back field by field; anything else is logged
/// with the acting user and reported as a retryable failure.
pub async fn store(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<InscripcionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Flash<Inscripcion>>)> {
    actor.require(ANY_ROLE)?;
    let request = json_body(payload)?;

    match enrollment::register(&state.db, &actor.uuid, request, now()).await {
        Ok(inscripcion) => Ok((
            StatusCode::CREATED,
            Json(Flash::new("Inscripcion registrada correctamente", inscripcion)),
        )),
        Err(padron_common::Error::Validation(errors)) => Err(ApiError::Validation(errors)),
        Err(e) => {
            error!(actor = %actor.uuid, error = %e, "Enrollment registration failed");
            Err(ApiError::Internal(REGISTER_FAILED.to_string()))
        }
    }
}

/// PUT /inscripciones/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<InscripcionUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<Flash<Inscripcion>>> {
    actor.require(STAFF)?;
    let request = json_body(payload)?;
    let inscripcion = enrollment::update(&state.db, &id, request, now()).await?;
    Ok(Json(Flash::new("Inscripcion actualizada correctamente", inscripcion)))
}

/// DELETE /inscripciones/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(STAFF)?;
    enrollment::delete(&state.db, &id).await?;
    Ok(Json(json!({ "status": "Inscripcion eliminada" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListaQuery {
    pub q: Option<String>,
    pub programa_id: Option<String>,
    pub periodo: Option<String>,
    pub estatus: Option<String>,
    pub page: Option<i64>,
}

impl ListaQuery {
    /// Unparseable filter values are dropped rather than rejected
    fn filter(&self) -> InscripcionListFilter {
        InscripcionListFilter {
            q: non_blank(self.q.as_deref()),
            programa_id: self.programa_id.as_deref().and_then(|v| v.trim().parse().ok()),
            periodo: non_blank(self.periodo.as_deref()),
            estatus: self.estatus.as_deref().and_then(Estatus::parse),
        }
    }
}

/// GET /inscripciones/lista
pub async fn lista(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListaQuery>,
) -> ApiResult<Json<Page<InscripcionListItem>>> {
    actor.require(STAFF)?;
    let page = inscripciones::list(&state.db, &query.filter(), query.page.unwrap_or(1)).await?;
    Ok(Json(page))
}

/// GET /inscripciones/kpis
pub async fn kpis(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<KpiQuery>,
) -> ApiResult<Json<InscripcionKpis>> {
    actor.require(STAFF)?;
    let now = now();
    let filter = InscripcionFilter::from_query(&query, now)?;
    Ok(Json(kpi::kpis(&state.db, &filter, now).await?))
}
