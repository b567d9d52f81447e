//! A clerk's own records and monthly tallies

use chrono::{Duration, NaiveDateTime};
use padron_common::time::{end_of_day, start_of_day, to_db, Month};
use padron_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::beneficiarios::{self, RegistroListItem};
use crate::pagination::Page;

/// Ages counted by the monthly youth tally
pub const AGE_RANGE: (i64, i64) = (17, 25);

const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, Serialize)]
pub struct MonthCount {
    pub label: &'static str,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MisRegistros {
    pub items: Page<RegistroListItem>,
    pub month: String,
    pub year: i32,
    pub total_month: i64,
    pub male_count: i64,
    pub female_count: i64,
    pub age_range_count: i64,
    pub monthly_counts: Vec<MonthCount>,
}

/// First and last second of `month`
fn month_bounds(month: Month) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let first = month
        .first_day()
        .ok_or_else(|| Error::InvalidInput(format!("mes fuera de rango: {month}")))?;
    let next = month
        .add(1)
        .first_day()
        .ok_or_else(|| Error::InvalidInput(format!("mes fuera de rango: {month}")))?;
    Ok((start_of_day(first), end_of_day(next - Duration::days(1))))
}

/// Listing page plus tallies for `month`; `month` defaults to the current one
pub async fn load(
    pool: &SqlitePool,
    uuid: &str,
    month: Option<&str>,
    page: i64,
    now: NaiveDateTime,
) -> Result<MisRegistros> {
    let month = month
        .and_then(Month::parse)
        .unwrap_or_else(|| Month::of(now.date()));
    let (start, end) = month_bounds(month)?;

    let items = beneficiarios::list_by_creator(pool, uuid, page).await?;

    let (total_month, male_count, female_count, age_range_count): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(sexo = 'M'), 0),
                   COALESCE(SUM(sexo = 'F'), 0),
                   COALESCE(SUM(edad BETWEEN ? AND ?), 0)
            FROM beneficiarios
            WHERE created_by = ? AND created_at BETWEEN ? AND ?
            "#,
        )
        .bind(AGE_RANGE.0)
        .bind(AGE_RANGE.1)
        .bind(uuid)
        .bind(to_db(start))
        .bind(to_db(end))
        .fetch_one(pool)
        .await?;

    let per_month: HashMap<i64, i64> = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT CAST(strftime('%m', created_at) AS INTEGER) AS m, COUNT(*)
        FROM beneficiarios
        WHERE created_by = ? AND strftime('%Y', created_at) = ?
        GROUP BY m
        "#,
    )
    .bind(uuid)
    .bind(format!("{:04}", month.year()))
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let monthly_counts = MONTH_LABELS
        .into_iter()
        .zip(1i64..)
        .map(|(label, m)| MonthCount {
            label,
            count: per_month.get(&m).copied().unwrap_or(0),
        })
        .collect();

    Ok(MisRegistros {
        items,
        month: month.to_string(),
        year: month.year(),
        total_month,
        male_count,
        female_count,
        age_range_count,
        monthly_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(Month::new(2024, 2).unwrap()).unwrap();
        assert_eq!(to_db(start), "2024-02-01 00:00:00");
        assert_eq!(to_db(end), "2024-02-29 23:59:59");

        let (_, end) = month_bounds(Month::new(2026, 12).unwrap()).unwrap();
        assert_eq!(to_db(end), "2026-12-31 23:59:59");
    }
}
