//! Beneficiary persistence

use chrono::NaiveDateTime;
use padron_common::db::Beneficiario;
use padron_common::time::to_db;
use padron_common::Result;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::pagination::{calculate_pagination, Page};

const SELECT_BENEFICIARIO: &str = r#"
    SELECT id, folio_tarjeta, nombre, apellido_paterno, apellido_materno, curp,
           fecha_nacimiento, edad, sexo, discapacidad, id_ine, telefono,
           municipio_id, seccion_id, created_by, created_at, updated_at
    FROM beneficiarios
"#;

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Beneficiario>> {
    let beneficiario = sqlx::query_as::<_, Beneficiario>(&format!("{SELECT_BENEFICIARIO} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(beneficiario)
}

pub async fn find_by_curp(
    conn: &mut SqliteConnection,
    curp: &str,
) -> Result<Option<Beneficiario>> {
    let beneficiario =
        sqlx::query_as::<_, Beneficiario>(&format!("{SELECT_BENEFICIARIO} WHERE curp = ?"))
            .bind(curp)
            .fetch_optional(conn)
            .await?;
    Ok(beneficiario)
}

/// Whether another beneficiary already holds `folio`
pub async fn folio_taken(
    conn: &mut SqliteConnection,
    folio: &str,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM beneficiarios WHERE folio_tarjeta = ? AND id != COALESCE(?, ''))",
    )
    .bind(folio)
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    Ok(taken)
}

/// Whether another beneficiary already holds `curp`
pub async fn curp_taken(
    conn: &mut SqliteConnection,
    curp: &str,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM beneficiarios WHERE curp = ? AND id != COALESCE(?, ''))",
    )
    .bind(curp)
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    Ok(taken)
}

pub async fn insert(conn: &mut SqliteConnection, b: &Beneficiario) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO beneficiarios (
            id, folio_tarjeta, nombre, apellido_paterno, apellido_materno, curp,
            fecha_nacimiento, edad, sexo, discapacidad, id_ine, telefono,
            municipio_id, seccion_id, created_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&b.id)
    .bind(&b.folio_tarjeta)
    .bind(&b.nombre)
    .bind(&b.apellido_paterno)
    .bind(&b.apellido_materno)
    .bind(&b.curp)
    .bind(b.fecha_nacimiento)
    .bind(b.edad)
    .bind(b.sexo)
    .bind(b.discapacidad)
    .bind(&b.id_ine)
    .bind(&b.telefono)
    .bind(b.municipio_id)
    .bind(b.seccion_id)
    .bind(&b.created_by)
    .bind(to_db(b.created_at))
    .bind(to_db(b.updated_at))
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrite the mutable fields of an existing beneficiary; id and creator stay
pub async fn update(conn: &mut SqliteConnection, b: &Beneficiario) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE beneficiarios SET
            folio_tarjeta = ?, nombre = ?, apellido_paterno = ?, apellido_materno = ?,
            curp = ?, fecha_nacimiento = ?, edad = ?, sexo = ?, discapacidad = ?,
            id_ine = ?, telefono = ?, municipio_id = ?, seccion_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&b.folio_tarjeta)
    .bind(&b.nombre)
    .bind(&b.apellido_paterno)
    .bind(&b.apellido_materno)
    .bind(&b.curp)
    .bind(b.fecha_nacimiento)
    .bind(b.edad)
    .bind(b.sexo)
    .bind(b.discapacidad)
    .bind(&b.id_ine)
    .bind(&b.telefono)
    .bind(b.municipio_id)
    .bind(b.seccion_id)
    .bind(to_db(b.updated_at))
    .bind(&b.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn has_inscripciones(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM inscripciones WHERE beneficiario_id = ?)")
            .bind(id)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

/// Delete a beneficiary; its address goes with it. Returns whether a row was removed.
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM beneficiarios WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Row of a clerk's own-records listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RegistroListItem {
    pub id: String,
    pub folio_tarjeta: Option<String>,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub curp: String,
    pub municipio: Option<String>,
    pub seccional: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Beneficiaries created by `uuid`, newest first
pub async fn list_by_creator(
    pool: &SqlitePool,
    uuid: &str,
    page: i64,
) -> Result<Page<RegistroListItem>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM beneficiarios WHERE created_by = ?")
        .bind(uuid)
        .fetch_one(pool)
        .await?;
    let pagination = calculate_pagination(total, page);

    let data = sqlx::query_as::<_, RegistroListItem>(
        r#"
        SELECT b.id, b.folio_tarjeta, b.nombre, b.apellido_paterno, b.apellido_materno, b.curp,
               m.nombre AS municipio, s.seccional, b.created_at
        FROM beneficiarios b
        LEFT JOIN municipios m ON m.id = b.municipio_id
        LEFT JOIN secciones s ON s.id = b.seccion_id
        WHERE b.created_by = ?
        ORDER BY b.created_at DESC, b.id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(uuid)
    .bind(pagination.per_page)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(Page { data, pagination })
}
