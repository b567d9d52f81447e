//! Enrollment persistence

use chrono::NaiveDateTime;
use padron_common::db::{Estatus, Inscripcion};
use padron_common::time::to_db;
use padron_common::Result;
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::pagination::{calculate_pagination, Page};

const SELECT_INSCRIPCION: &str = r#"
    SELECT id, beneficiario_id, programa_id, periodo, estatus, fecha_renovacion,
           created_by, created_at, updated_at
    FROM inscripciones
"#;

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Inscripcion>> {
    let inscripcion = sqlx::query_as::<_, Inscripcion>(&format!("{SELECT_INSCRIPCION} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(inscripcion)
}

/// Whether the (beneficiary, program, periodo) triple is already enrolled,
/// ignoring `exclude_id`
pub async fn triple_exists(
    conn: &mut SqliteConnection,
    beneficiario_id: &str,
    programa_id: i64,
    periodo: &str,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM inscripciones
            WHERE beneficiario_id = ? AND programa_id = ? AND periodo = ?
              AND id != COALESCE(?, '')
        )
        "#,
    )
    .bind(beneficiario_id)
    .bind(programa_id)
    .bind(periodo)
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

pub async fn insert(conn: &mut SqliteConnection, i: &Inscripcion) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO inscripciones (
            id, beneficiario_id, programa_id, periodo, estatus, fecha_renovacion,
            created_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&i.id)
    .bind(&i.beneficiario_id)
    .bind(i.programa_id)
    .bind(&i.periodo)
    .bind(i.estatus)
    .bind(i.fecha_renovacion.map(to_db))
    .bind(&i.created_by)
    .bind(to_db(i.created_at))
    .bind(to_db(i.updated_at))
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: &str,
    programa_id: i64,
    periodo: &str,
    estatus: Estatus,
    now: NaiveDateTime,
) -> Result<()> {
    sqlx::query(
        "UPDATE inscripciones SET programa_id = ?, periodo = ?, estatus = ?, updated_at = ? WHERE id = ?",
    )
    .bind(programa_id)
    .bind(periodo)
    .bind(estatus)
    .bind(to_db(now))
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM inscripciones WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Enrollments created by `uuid` with `created_at` in `[start, end]`
pub async fn count_created_between(
    pool: &SqlitePool,
    uuid: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM inscripciones WHERE created_by = ? AND created_at BETWEEN ? AND ?",
    )
    .bind(uuid)
    .bind(to_db(start))
    .bind(to_db(end))
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Listing filters; empty means unfiltered
#[derive(Debug, Clone, Default)]
pub struct InscripcionListFilter {
    pub q: Option<String>,
    pub programa_id: Option<i64>,
    pub periodo: Option<String>,
    pub estatus: Option<Estatus>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InscripcionListItem {
    pub id: String,
    pub beneficiario_id: String,
    pub curp: String,
    pub nombre_completo: String,
    pub programa_id: i64,
    pub programa: String,
    pub periodo: String,
    pub estatus: Estatus,
    pub fecha_renovacion: Option<NaiveDateTime>,
    pub created_by: String,
    pub creador: Option<String>,
    pub created_at: NaiveDateTime,
}

fn push_list_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &InscripcionListFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(term) = &filter.q {
        let pattern = super::like_pattern(term);
        qb.push(" AND (");
        let mut columns = qb.separated(" OR ");
        for column in [
            "b.curp",
            "b.nombre",
            "b.apellido_paterno",
            "b.apellido_materno",
            "p.nombre",
        ] {
            columns.push(format!("{column} LIKE "));
            columns.push_bind_unseparated(pattern.clone());
        }
        qb.push(")");
    }
    if let Some(programa_id) = filter.programa_id {
        qb.push(" AND i.programa_id = ").push_bind(programa_id);
    }
    if let Some(periodo) = &filter.periodo {
        qb.push(" AND i.periodo = ").push_bind(periodo.clone());
    }
    if let Some(estatus) = filter.estatus {
        qb.push(" AND i.estatus = ").push_bind(estatus);
    }
}

const LIST_FROM: &str = r#"
    FROM inscripciones i
    JOIN beneficiarios b ON b.id = i.beneficiario_id
    JOIN programas p ON p.id = i.programa_id
    LEFT JOIN users u ON u.uuid = i.created_by
"#;

/// Newest first, 15 per page
pub async fn list(
    pool: &SqlitePool,
    filter: &InscripcionListFilter,
    page: i64,
) -> Result<Page<InscripcionListItem>> {
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) {LIST_FROM}"));
    push_list_filters(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;
    let pagination = calculate_pagination(total, page);

    let mut select = QueryBuilder::<Sqlite>::new(format!(
        r#"
        SELECT i.id, i.beneficiario_id, b.curp,
               b.nombre || ' ' || b.apellido_paterno || ' ' || b.apellido_materno AS nombre_completo,
               i.programa_id, p.nombre AS programa, i.periodo, i.estatus, i.fecha_renovacion,
               i.created_by, u.name AS creador, i.created_at
        {LIST_FROM}
        "#
    ));
    push_list_filters(&mut select, filter);
    select
        .push(" ORDER BY i.created_at DESC, i.id LIMIT ")
        .push_bind(pagination.per_page)
        .push(" OFFSET ")
        .push_bind(pagination.offset);
    let data = select
        .build_query_as::<InscripcionListItem>()
        .fetch_all(pool)
        .await?;

    Ok(Page { data, pagination })
}
