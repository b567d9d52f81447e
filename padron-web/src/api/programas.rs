//! Program administration endpoints (admin only)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use padron_common::db::Programa;
use padron_common::time::now;
use padron_common::validation::non_blank;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::{Actor, ADMIN_ONLY};
use crate::api::{json_body, Flash};
use crate::db::programas as store;
use crate::error::ApiResult;
use crate::pagination::Page;
use crate::services::programas::{self, ProgramaRequest};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProgramaListQuery {
    pub q: Option<String>,
    pub activo: Option<String>,
    pub page: Option<i64>,
}

/// `1`/`true` and `0`/`false`; anything else means no filter
fn parse_activo(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        Some("1") | Some("true") => Some(true),
        Some("0") | Some("false") => Some(false),
        _ => None,
    }
}

/// GET /programas
pub async fn index(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ProgramaListQuery>,
) -> ApiResult<Json<Page<Programa>>> {
    actor.require(ADMIN_ONLY)?;
    let q = non_blank(query.q.as_deref());
    let page = store::list(
        &state.db,
        q.as_deref(),
        parse_activo(query.activo.as_deref()),
        query.page.unwrap_or(1),
    )
    .await?;
    Ok(Json(page))
}

/// POST /programas
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<ProgramaRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Flash<Programa>>)> {
    actor.require(ADMIN_ONLY)?;
    let request = json_body(payload)?;
    let programa = programas::create(&state.db, request, now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(Flash::new("Programa creado correctamente", programa)),
    ))
}

/// PUT /programas/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    payload: Result<Json<ProgramaRequest>, JsonRejection>,
) -> ApiResult<Json<Flash<Programa>>> {
    actor.require(ADMIN_ONLY)?;
    let request = json_body(payload)?;
    let programa = programas::update(&state.db, id, request, now()).await?;
    Ok(Json(Flash::new("Programa actualizado correctamente", programa)))
}

/// DELETE /programas/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    actor.require(ADMIN_ONLY)?;
    programas::delete(&state.db, id).await?;
    Ok(Json(json!({ "status": "Programa eliminado" })))
}
