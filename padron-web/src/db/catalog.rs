//! Geographic catalog lookups

use padron_common::db::Municipio;
use padron_common::Result;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

/// A section code resolved to its municipality and districts
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SeccionResuelta {
    pub seccion_id: i64,
    pub seccional: String,
    pub municipio_id: i64,
    pub municipio: String,
    pub distrito_local: Option<String>,
    pub distrito_federal: Option<String>,
}

/// Codes to try, in order, for a user-entered section code.
///
/// The catalog stores codes as text and imports disagree on zero padding,
/// so an all-digit code is also tried padded to four digits and stripped of
/// leading zeros.
pub fn seccional_candidates(code: &str) -> Vec<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![trimmed.to_string()];
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        let padded = format!("{:0>4}", trimmed);
        let stripped = match trimmed.trim_start_matches('0') {
            "" => "0".to_string(),
            s => s.to_string(),
        };
        for candidate in [padded, stripped] {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Resolve a section code; `None` when no candidate matches
pub async fn resolve_seccion(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<SeccionResuelta>> {
    for candidate in seccional_candidates(code) {
        let found = sqlx::query_as::<_, SeccionResuelta>(
            r#"
            SELECT s.id AS seccion_id, s.seccional, s.municipio_id, m.nombre AS municipio,
                   s.distrito_local, s.distrito_federal
            FROM secciones s
            JOIN municipios m ON m.id = s.municipio_id
            WHERE s.seccional = ?
            "#,
        )
        .bind(&candidate)
        .fetch_optional(&mut *conn)
        .await?;

        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

pub async fn list_municipios(pool: &SqlitePool) -> Result<Vec<Municipio>> {
    let municipios =
        sqlx::query_as::<_, Municipio>("SELECT id, clave, nombre FROM municipios ORDER BY nombre")
            .fetch_all(pool)
            .await?;
    Ok(municipios)
}
