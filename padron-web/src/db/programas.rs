//! Program persistence

use chrono::NaiveDateTime;
use padron_common::db::{Programa, TipoPeriodo};
use padron_common::time::to_db;
use padron_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::pagination::{calculate_pagination, Page};

const SELECT_PROGRAMA: &str =
    "SELECT id, nombre, slug, tipo_periodo, renovable, activo, created_at, updated_at FROM programas";

/// Validated program attributes
#[derive(Debug, Clone)]
pub struct ProgramaDatos {
    pub nombre: String,
    pub slug: String,
    pub tipo_periodo: TipoPeriodo,
    pub renovable: bool,
    pub activo: bool,
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Programa>> {
    let programa = sqlx::query_as::<_, Programa>(&format!("{SELECT_PROGRAMA} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(programa)
}

pub async fn slug_taken(
    conn: &mut SqliteConnection,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM programas WHERE slug = ? AND id != COALESCE(?, -1))",
    )
    .bind(slug)
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    Ok(taken)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    datos: &ProgramaDatos,
    now: NaiveDateTime,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO programas (nombre, slug, tipo_periodo, renovable, activo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&datos.nombre)
    .bind(&datos.slug)
    .bind(datos.tipo_periodo)
    .bind(datos.renovable)
    .bind(datos.activo)
    .bind(to_db(now))
    .bind(to_db(now))
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    datos: &ProgramaDatos,
    now: NaiveDateTime,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE programas
        SET nombre = ?, slug = ?, tipo_periodo = ?, renovable = ?, activo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&datos.nombre)
    .bind(&datos.slug)
    .bind(datos.tipo_periodo)
    .bind(datos.renovable)
    .bind(datos.activo)
    .bind(to_db(now))
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn has_inscripciones(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM inscripciones WHERE programa_id = ?)")
            .bind(id)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM programas WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active programs by name, for capture forms
pub async fn list_activos(pool: &SqlitePool) -> Result<Vec<Programa>> {
    let programas =
        sqlx::query_as::<_, Programa>(&format!("{SELECT_PROGRAMA} WHERE activo = 1 ORDER BY nombre"))
            .fetch_all(pool)
            .await?;
    Ok(programas)
}

/// Admin listing: free text over name/slug, optional active filter
pub async fn list(
    pool: &SqlitePool,
    q: Option<&str>,
    activo: Option<bool>,
    page: i64,
) -> Result<Page<Programa>> {
    fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, q: Option<&str>, activo: Option<bool>) {
        qb.push(" WHERE 1 = 1");
        if let Some(term) = q {
            let pattern = super::like_pattern(term);
            qb.push(" AND (nombre LIKE ")
                .push_bind(pattern.clone())
                .push(" OR slug LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(activo) = activo {
            qb.push(" AND activo = ").push_bind(activo);
        }
    }

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM programas");
    push_filters(&mut count, q, activo);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;
    let pagination = calculate_pagination(total, page);

    let mut select = QueryBuilder::<Sqlite>::new(SELECT_PROGRAMA);
    push_filters(&mut select, q, activo);
    select
        .push(" ORDER BY nombre, id LIMIT ")
        .push_bind(pagination.per_page)
        .push(" OFFSET ")
        .push_bind(pagination.offset);
    let data = select.build_query_as::<Programa>().fetch_all(pool).await?;

    Ok(Page { data, pagination })
}
