//! Dashboard filters
//!
//! Query parameters are parsed once into an immutable filter value, and a
//! pure function turns that value into the `WHERE` clause of a query.

use chrono::{NaiveDate, NaiveDateTime};
use padron_common::time::{to_db, Month};
use padron_common::validation::{non_blank, parse_iso_date};
use padron_common::FieldErrors;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::db::like_pattern;

/// Raw dashboard query string; blank values count as absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KpiQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub municipio_id: Option<String>,
    pub seccional: Option<String>,
    pub capturista: Option<String>,
    pub programa_id: Option<String>,
}

/// Resolved `from`/`to` dates, echoed back in dashboard responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Parse both ends; a reversed range is swapped
    fn parse(query: &KpiQuery, errors: &mut FieldErrors) -> Self {
        let mut date = |field: &str, value: &Option<String>| {
            let value = non_blank(value.as_deref())?;
            let parsed = parse_iso_date(&value);
            if parsed.is_none() {
                errors.add(field, format!("El campo {field} debe ser una fecha AAAA-MM-DD."));
            }
            parsed
        };
        let from = date("from", &query.from);
        let to = date("to", &query.to);

        match (from, to) {
            (Some(f), Some(t)) if f > t => Self {
                from: Some(t),
                to: Some(f),
            },
            _ => Self { from, to },
        }
    }
}

fn parse_id(field: &str, value: &Option<String>, errors: &mut FieldErrors) -> Option<i64> {
    let value = non_blank(value.as_deref())?;
    let parsed = value.parse::<i64>().ok();
    if parsed.is_none() {
        errors.add(field, format!("El campo {field} debe ser un numero entero."));
    }
    parsed
}

/// Beneficiary dataset filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeneficiarioFilter {
    pub municipio_id: Option<i64>,
    /// Substring of the section code
    pub seccional: Option<String>,
    /// Creator uuid
    pub capturista: Option<String>,
    pub range: DateRange,
}

impl BeneficiarioFilter {
    pub fn from_query(query: &KpiQuery) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let range = DateRange::parse(query, &mut errors);
        let municipio_id = parse_id("municipio_id", &query.municipio_id, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            municipio_id,
            seccional: non_blank(query.seccional.as_deref()),
            capturista: non_blank(query.capturista.as_deref()),
            range,
        })
    }

    /// A clerk's own records, optionally within `from`/`to`
    pub fn own_records(uuid: &str, query: &KpiQuery) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let range = DateRange::parse(query, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            capturista: Some(uuid.to_string()),
            range,
            ..Self::default()
        })
    }

    /// Same filter with the clerk restriction removed
    pub fn without_capturista(&self) -> Self {
        Self {
            capturista: None,
            ..self.clone()
        }
    }
}

/// Start a beneficiary query: `select_from` must alias `beneficiarios` as `b`.
///
/// The returned builder ends inside a `WHERE` clause, so callers may append
/// further `AND` conditions before grouping or ordering.
pub fn beneficiario_query(select_from: &str, filter: &BeneficiarioFilter) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(select_from);
    qb.push(" WHERE 1 = 1");

    if let Some(municipio_id) = filter.municipio_id {
        qb.push(" AND b.municipio_id = ").push_bind(municipio_id);
    }
    if let Some(seccional) = &filter.seccional {
        qb.push(" AND b.seccion_id IN (SELECT id FROM secciones WHERE seccional LIKE ")
            .push_bind(like_pattern(seccional))
            .push(")");
    }
    if let Some(capturista) = &filter.capturista {
        qb.push(" AND b.created_by = ").push_bind(capturista.clone());
    }
    if let Some(from) = filter.range.from {
        qb.push(" AND DATE(b.created_at) >= ").push_bind(from.to_string());
    }
    if let Some(to) = filter.range.to {
        qb.push(" AND DATE(b.created_at) <= ").push_bind(to.to_string());
    }

    qb
}

/// Append a `created_at` window (inclusive at both ends)
pub fn push_created_between(
    qb: &mut QueryBuilder<'static, Sqlite>,
    column: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) {
    qb.push(format!(" AND {column} BETWEEN "))
        .push_bind(to_db(start))
        .push(" AND ")
        .push_bind(to_db(end));
}

/// Longest periodo span one enrollment dashboard request covers
pub const MAX_MONTH_SPAN: i32 = 60;

/// Enrollment dataset filter over a span of periodo months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InscripcionFilter {
    pub programa_id: Option<i64>,
    pub from: Month,
    pub to: Month,
}

impl InscripcionFilter {
    /// Missing or malformed months fall back to the last 12 months ending
    /// with the current one; a reversed span is swapped. Spans longer than
    /// [`MAX_MONTH_SPAN`] keep `to` and move `from` forward.
    pub fn from_query(query: &KpiQuery, now: NaiveDateTime) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let programa_id = parse_id("programa_id", &query.programa_id, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        let current = Month::of(now.date());
        let month = |value: &Option<String>| value.as_deref().and_then(Month::parse);
        let from = month(&query.from).unwrap_or_else(|| current.add(-11));
        let to = month(&query.to).unwrap_or(current);
        let (from, to) = if from > to { (to, from) } else { (from, to) };
        let from = from.max(to.add(1 - MAX_MONTH_SPAN));

        Ok(Self {
            programa_id,
            from,
            to,
        })
    }
}

/// Start an enrollment query: `select_from` must alias `inscripciones` as `i`.
/// Restricts to the filter's periodo span and program.
pub fn inscripcion_query(select_from: &str, filter: &InscripcionFilter) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(select_from);
    qb.push(" WHERE i.periodo BETWEEN ")
        .push_bind(filter.from.to_string())
        .push(" AND ")
        .push_bind(filter.to.to_string());
    if let Some(programa_id) = filter.programa_id {
        qb.push(" AND i.programa_id = ").push_bind(programa_id);
    }
    qb
}
