//! Beneficiary dashboards (admin and clerk)

use chrono::{Duration, NaiveDateTime};
use padron_common::time::{end_of_week, last_30_days_start, start_of_day, start_of_week};
use padron_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use super::filters::{beneficiario_query, push_created_between, BeneficiarioFilter, DateRange};
use super::series::{daily_series, Breakdown, Series};
use super::TOP_N;
use crate::db::usuarios;

/// Ages counted by the fixed age-range indicator
pub const AGE_RANGE: (i64, i64) = (18, 28);
const AGE_RANGE_LABEL: &str = "18-28";
const BOARD_WEEKS: i64 = 4;

#[derive(Debug, Clone, Serialize)]
pub struct Total {
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeRange {
    pub total: i64,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekBoardRow {
    pub uuid: String,
    pub name: String,
    pub counts: Vec<i64>,
    pub total: i64,
}

/// Records per clerk over the last four calendar weeks
#[derive(Debug, Clone, Serialize)]
pub struct WeekBoard {
    /// Week start dates, oldest first
    pub labels: Vec<String>,
    pub rows: Vec<WeekBoardRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminKpis {
    pub totals: Total,
    pub age_range: AgeRange,
    pub by_municipio: Breakdown,
    pub by_seccional: Breakdown,
    pub by_capturista: Breakdown,
    pub today: Total,
    pub week: Series,
    pub last30_days: Series,
    pub capturistas_week_board: WeekBoard,
    pub range: DateRange,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Ultimo {
    pub id: String,
    pub folio_tarjeta: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturistaKpis {
    pub today: i64,
    pub week: i64,
    pub last30_days: i64,
    pub age_range: AgeRange,
    pub ultimos: Vec<Ultimo>,
    pub series: Series,
    pub range: DateRange,
}

/// Beneficiaries aged 18 to 28, across the whole register.
///
/// Ignores every dashboard filter.
pub async fn age_range(pool: &SqlitePool) -> Result<AgeRange> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM beneficiarios WHERE edad BETWEEN ? AND ?")
            .bind(AGE_RANGE.0)
            .bind(AGE_RANGE.1)
            .fetch_one(pool)
            .await?;
    Ok(AgeRange {
        total,
        label: AGE_RANGE_LABEL,
    })
}

async fn count(
    pool: &SqlitePool,
    filter: &BeneficiarioFilter,
    window: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<i64> {
    let mut qb = beneficiario_query("SELECT COUNT(*) FROM beneficiarios b", filter);
    if let Some((start, end)) = window {
        push_created_between(&mut qb, "b.created_at", start, end);
    }
    let total = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(total)
}

async fn daily(
    pool: &SqlitePool,
    filter: &BeneficiarioFilter,
    start: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<Series> {
    let mut qb = beneficiario_query(
        "SELECT DATE(b.created_at) AS d, COUNT(*) AS c FROM beneficiarios b",
        filter,
    );
    push_created_between(&mut qb, "b.created_at", start, now);
    qb.push(" GROUP BY d");
    let rows: HashMap<String, i64> = qb
        .build_query_as::<(String, i64)>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();
    Ok(daily_series(&rows, start.date(), now.date()))
}

async fn grouped(
    pool: &SqlitePool,
    filter: &BeneficiarioFilter,
    select_from: &str,
    tail: &str,
) -> Result<Breakdown> {
    let mut qb = beneficiario_query(select_from, filter);
    qb.push(tail);
    let rows = qb.build_query_as::<(String, i64)>().fetch_all(pool).await?;
    Ok(Breakdown::from(rows))
}

async fn week_board(
    pool: &SqlitePool,
    filter: &BeneficiarioFilter,
    now: NaiveDateTime,
) -> Result<WeekBoard> {
    let filter = filter.without_capturista();
    let current = start_of_week(now);
    let weeks: Vec<NaiveDateTime> = (0..BOARD_WEEKS)
        .rev()
        .map(|i| current - Duration::weeks(i))
        .collect();

    let mut per_week = Vec::with_capacity(weeks.len());
    for week_start in &weeks {
        let mut qb = beneficiario_query(
            "SELECT b.created_by, COUNT(*) AS c FROM beneficiarios b",
            &filter,
        );
        push_created_between(&mut qb, "b.created_at", *week_start, end_of_week(*week_start));
        qb.push(" GROUP BY b.created_by");
        let counts: HashMap<String, i64> = qb
            .build_query_as::<(String, i64)>()
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();
        per_week.push(counts);
    }

    let rows = usuarios::list_capturistas(pool)
        .await?
        .into_iter()
        .map(|usuario| {
            let counts: Vec<i64> = per_week
                .iter()
                .map(|week| week.get(&usuario.uuid).copied().unwrap_or(0))
                .collect();
            WeekBoardRow {
                total: counts.iter().sum(),
                uuid: usuario.uuid,
                name: usuario.name,
                counts,
            }
        })
        .collect();

    Ok(WeekBoard {
        labels: weeks
            .iter()
            .map(|w| w.date().format("%Y-%m-%d").to_string())
            .collect(),
        rows,
    })
}

/// Admin dashboard over the filtered beneficiary set
pub async fn admin_kpis(
    pool: &SqlitePool,
    filter: &BeneficiarioFilter,
    now: NaiveDateTime,
) -> Result<AdminKpis> {
    let by_municipio = grouped(
        pool,
        filter,
        "SELECT COALESCE(m.nombre, 'N/A') AS label, COUNT(*) AS c \
         FROM beneficiarios b LEFT JOIN municipios m ON m.id = b.municipio_id",
        " GROUP BY b.municipio_id ORDER BY c DESC, label",
    )
    .await?;
    let by_seccional = grouped(
        pool,
        filter,
        "SELECT s.seccional AS label, COUNT(*) AS c \
         FROM beneficiarios b JOIN secciones s ON s.id = b.seccion_id",
        &format!(" GROUP BY s.seccional ORDER BY c DESC, label LIMIT {TOP_N}"),
    )
    .await?;
    let by_capturista = grouped(
        pool,
        filter,
        "SELECT COALESCE(u.name, b.created_by) AS label, COUNT(*) AS c \
         FROM beneficiarios b LEFT JOIN users u ON u.uuid = b.created_by",
        &format!(" GROUP BY b.created_by ORDER BY c DESC, label LIMIT {TOP_N}"),
    )
    .await?;

    Ok(AdminKpis {
        totals: Total {
            total: count(pool, filter, None).await?,
        },
        age_range: age_range(pool).await?,
        by_municipio,
        by_seccional,
        by_capturista,
        today: Total {
            total: count(pool, filter, Some((start_of_day(now.date()), now))).await?,
        },
        week: daily(pool, filter, start_of_week(now), now).await?,
        last30_days: daily(pool, filter, last_30_days_start(now), now).await?,
        capturistas_week_board: week_board(pool, filter, now).await?,
        range: filter.range,
    })
}

/// A clerk's own progress; `filter` carries the clerk as `capturista`
pub async fn capturista_kpis(
    pool: &SqlitePool,
    filter: &BeneficiarioFilter,
    now: NaiveDateTime,
) -> Result<CapturistaKpis> {
    let start30 = last_30_days_start(now);

    let mut latest = beneficiario_query(
        "SELECT b.id, b.folio_tarjeta, b.created_at FROM beneficiarios b",
        filter,
    );
    latest.push(format!(" ORDER BY b.created_at DESC, b.id LIMIT {TOP_N}"));
    let ultimos = latest.build_query_as::<Ultimo>().fetch_all(pool).await?;

    Ok(CapturistaKpis {
        today: count(pool, filter, Some((start_of_day(now.date()), now))).await?,
        week: count(pool, filter, Some((start_of_week(now), now))).await?,
        last30_days: count(pool, filter, Some((start30, now))).await?,
        age_range: age_range(pool).await?,
        ultimos,
        series: daily(pool, filter, start30, now).await?,
        range: filter.range,
    })
}
