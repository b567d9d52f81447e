//! Bulk beneficiary staging endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use padron_common::time::now;
use serde_json::Value;

use crate::api::auth::{Actor, STAFF};
use crate::api::json_body;
use crate::error::ApiResult;
use crate::services::import_cache::{self, ImportRequest, StagedBatch};
use crate::AppState;

/// POST /api/beneficiarios/cache
pub async fn store(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StagedBatch>)> {
    actor.require(STAFF)?;
    let request = json_body(payload)?;
    let staged = import_cache::stage(&state.db, &actor.uuid, request, now()).await?;
    Ok((StatusCode::CREATED, Json(staged)))
}

/// GET /api/beneficiarios/cache/:key
pub async fn show(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(STAFF)?;
    Ok(Json(import_cache::fetch(&state.db, &key, now()).await?))
}
