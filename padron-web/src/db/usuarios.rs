//! User lookups (accounts are managed elsewhere)

use padron_common::db::Usuario;
use padron_common::Result;
use sqlx::SqlitePool;

pub async fn find_by_uuid(pool: &SqlitePool, uuid: &str) -> Result<Option<Usuario>> {
    let usuario =
        sqlx::query_as::<_, Usuario>("SELECT uuid, name, email, role FROM users WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(pool)
            .await?;
    Ok(usuario)
}

/// Clerk accounts (both capturista roles), ordered by name
pub async fn list_capturistas(pool: &SqlitePool) -> Result<Vec<Usuario>> {
    let usuarios = sqlx::query_as::<_, Usuario>(
        r#"
        SELECT uuid, name, email, role FROM users
        WHERE role IN ('capturista', 'capturista_programas')
        ORDER BY name, uuid
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(usuarios)
}
