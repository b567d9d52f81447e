//! Bucketed series and grouped breakdowns
//!
//! Counts come back from SQL only for buckets that have rows. These helpers
//! walk the full span and zero-fill, so `labels` and `data` always line up
//! and `total` is their sum.

use chrono::{Duration, NaiveDate};
use padron_common::time::Month;
use serde::Serialize;
use std::collections::HashMap;

/// Time series over consecutive buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
    pub total: i64,
}

impl Series {
    fn from_buckets(buckets: impl IntoIterator<Item = (String, i64)>) -> Self {
        let (labels, data): (Vec<String>, Vec<i64>) = buckets.into_iter().unzip();
        let total = data.iter().sum();
        Self {
            labels,
            data,
            total,
        }
    }
}

/// Count per category, already ordered by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

impl From<Vec<(String, i64)>> for Breakdown {
    fn from(rows: Vec<(String, i64)>) -> Self {
        let (labels, data) = rows.into_iter().unzip();
        Self { labels, data }
    }
}

/// One bucket per day from `start` to `end` inclusive, labelled `YYYY-MM-DD`.
///
/// `counts` is keyed by the same label text SQLite's `DATE()` produces.
pub fn daily_series(counts: &HashMap<String, i64>, start: NaiveDate, end: NaiveDate) -> Series {
    let mut buckets = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let label = cursor.format("%Y-%m-%d").to_string();
        let count = counts.get(&label).copied().unwrap_or(0);
        buckets.push((label, count));
        cursor += Duration::days(1);
    }
    Series::from_buckets(buckets)
}

/// One bucket per month from `start` to `end` inclusive, labelled `YYYY-MM`
pub fn monthly_series(counts: &HashMap<String, i64>, start: Month, end: Month) -> Series {
    let mut buckets = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let label = cursor.to_string();
        let count = counts.get(&label).copied().unwrap_or(0);
        buckets.push((label, count));
        cursor = cursor.add(1);
    }
    Series::from_buckets(buckets)
}
