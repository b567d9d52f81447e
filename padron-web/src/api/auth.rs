//! Acting-user identification
//!
//! Authentication happens upstream of this service; the gateway forwards the
//! signed-in user's uuid in `X-User-Id`. The middleware resolves it against
//! `users` and stores the [`Actor`] in the request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use padron_common::db::Rol;
use tracing::{debug, warn};

use crate::db::usuarios;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const USER_HEADER: &str = "x-user-id";

pub const ADMIN_ONLY: &[Rol] = &[Rol::Admin];
pub const CAPTURISTA_ONLY: &[Rol] = &[Rol::Capturista];
/// Admins and general clerks
pub const STAFF: &[Rol] = &[Rol::Admin, Rol::Capturista];
pub const ANY_ROLE: &[Rol] = &[Rol::Admin, Rol::Capturista, Rol::CapturistaProgramas];

/// The user on whose behalf a request runs
#[derive(Debug, Clone)]
pub struct Actor {
    pub uuid: String,
    pub name: String,
    pub role: Rol,
}

impl Actor {
    /// `Forbidden` unless the actor holds one of `roles`
    pub fn require(&self, roles: &[Rol]) -> ApiResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            debug!(actor = %self.uuid, role = self.role.as_str(), "Role not permitted");
            Err(ApiError::Forbidden)
        }
    }
}

/// Resolve `X-User-Id` to an [`Actor`]; 401 when missing or unknown
pub async fn actor_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let uuid = request
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Unauthenticated)?;

    let usuario = usuarios::find_by_uuid(&state.db, &uuid).await?.ok_or_else(|| {
        warn!(uuid = %uuid, "Request from unknown user");
        ApiError::Unauthenticated
    })?;

    request.extensions_mut().insert(Actor {
        uuid: usuario.uuid,
        name: usuario.name,
        role: usuario.role,
    });

    Ok(next.run(request).await)
}
