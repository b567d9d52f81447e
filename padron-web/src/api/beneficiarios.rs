//! A clerk's own records, and admin removal of beneficiaries

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use padron_common::db::Beneficiario;
use padron_common::time::now;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::{Actor, ADMIN_ONLY, CAPTURISTA_ONLY};
use crate::api::{json_body, Flash};
use crate::db::beneficiarios;
use crate::error::{ApiError, ApiResult};
use crate::kpi::mis_registros::{self, MisRegistros};
use crate::services::perfil::{self, Perfil, PerfilRequest};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MisRegistrosQuery {
    pub month: Option<String>,
    pub page: Option<i64>,
}

/// GET /mis-registros
pub async fn index(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MisRegistrosQuery>,
) -> ApiResult<Json<MisRegistros>> {
    actor.require(CAPTURISTA_ONLY)?;
    let registros = mis_registros::load(
        &state.db,
        &actor.uuid,
        query.month.as_deref(),
        query.page.unwrap_or(1),
        now(),
    )
    .await?;
    Ok(Json(registros))
}

/// Load a beneficiary the actor created; 404 when absent, 403 when not theirs
async fn own_record(state: &AppState, actor: &Actor, id: &str) -> ApiResult<Beneficiario> {
    let mut conn = state.db.acquire().await.map_err(padron_common::Error::from)?;
    let beneficiario = beneficiarios::find_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Beneficiario {id}")))?;
    if beneficiario.created_by != actor.uuid {
        return Err(ApiError::Forbidden);
    }
    Ok(beneficiario)
}

/// GET /mis-registros/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Perfil>> {
    actor.require(CAPTURISTA_ONLY)?;
    own_record(&state, &actor, &id).await?;
    let perfil = perfil::load(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Beneficiario {id}")))?;
    Ok(Json(perfil))
}

/// PUT /mis-registros/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<PerfilRequest>, JsonRejection>,
) -> ApiResult<Json<Flash<Perfil>>> {
    actor.require(CAPTURISTA_ONLY)?;
    let request = json_body(payload)?;
    own_record(&state, &actor, &id).await?;
    let perfil = perfil::update(&state.db, &id, request, now()).await?;
    Ok(Json(Flash::new("Actualizado correctamente", perfil)))
}

/// DELETE /beneficiarios/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(ADMIN_ONLY)?;
    perfil::delete(&state.db, &id).await?;
    Ok(Json(json!({ "status": "Beneficiario eliminado" })))
}
