//! Enrollment dashboard

use chrono::NaiveDateTime;
use padron_common::time::Month;
use padron_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use super::filters::{inscripcion_query, InscripcionFilter};
use super::series::{monthly_series, Breakdown, Series};
use super::TOP_N;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionTotals {
    pub total: i64,
    pub current_month: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionKpis {
    pub totals: InscripcionTotals,
    pub monthly: Series,
    pub by_programa: Breakdown,
    pub range: MonthRange,
}

pub async fn kpis(
    pool: &SqlitePool,
    filter: &InscripcionFilter,
    now: NaiveDateTime,
) -> Result<InscripcionKpis> {
    let total = inscripcion_query("SELECT COUNT(*) FROM inscripciones i", filter)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let mut per_month = inscripcion_query(
        "SELECT i.periodo, COUNT(*) AS c FROM inscripciones i",
        filter,
    );
    per_month.push(" GROUP BY i.periodo");
    let rows: HashMap<String, i64> = per_month
        .build_query_as::<(String, i64)>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    let mut per_programa = inscripcion_query(
        "SELECT COALESCE(p.nombre, CAST(i.programa_id AS TEXT)) AS label, COUNT(*) AS c \
         FROM inscripciones i LEFT JOIN programas p ON p.id = i.programa_id",
        filter,
    );
    per_programa.push(format!(" GROUP BY i.programa_id ORDER BY c DESC, label LIMIT {TOP_N}"));
    let by_programa = per_programa
        .build_query_as::<(String, i64)>()
        .fetch_all(pool)
        .await?;

    // Current month counts regardless of the selected span
    let current = Month::of(now.date());
    let current_filter = InscripcionFilter {
        from: current,
        to: current,
        ..*filter
    };
    let current_month = inscripcion_query("SELECT COUNT(*) FROM inscripciones i", &current_filter)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok(InscripcionKpis {
        totals: InscripcionTotals {
            total,
            current_month,
        },
        monthly: monthly_series(&rows, filter.from, filter.to),
        by_programa: Breakdown::from(by_programa),
        range: MonthRange {
            from: filter.from.to_string(),
            to: filter.to.to_string(),
        },
    })
}
