//! Section code lookup

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;

use crate::api::auth::{Actor, ANY_ROLE};
use crate::db::catalog::{self, SeccionResuelta};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
struct SeccionEncontrada {
    found: bool,
    #[serde(flatten)]
    seccion: SeccionResuelta,
}

/// GET /api/secciones/:seccional
///
/// Resolved section with its municipality and districts, or
/// 404 `{found: false}` when the code is not in the catalog.
pub async fn show(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(seccional): Path<String>,
) -> ApiResult<Response> {
    actor.require(ANY_ROLE)?;

    let mut conn = state.db.acquire().await.map_err(padron_common::Error::from)?;
    let response = match catalog::resolve_seccion(&mut conn, &seccional).await? {
        Some(seccion) => Json(SeccionEncontrada {
            found: true,
            seccion,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "found": false,
                "message": "La seccional no se encuentra en el catalogo.",
            })),
        )
            .into_response(),
    };
    Ok(response)
}
