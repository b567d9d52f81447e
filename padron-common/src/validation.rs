//! Field-level validation errors and shared input validators

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// CURP: 4 letters, YYMMDD, sex, state, 3 consonants, 2 check characters
static CURP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][AEIOUX][A-Z]{2}\d{2}(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])[HMX][A-Z]{2}[A-Z]{3}[A-Z0-9]{2}$")
        .expect("valid CURP regex")
});

static PERIODO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("valid periodo regex"));

/// Errors keyed by input field name, in stable order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Merge another set of errors, prefixing its field names
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            let key = format!("{prefix}.{field}");
            self.0.entry(key).or_default().extend(messages);
        }
    }

    /// `Ok(())` when empty, otherwise `Error::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }

    // Field checks. Each records at most one message and returns whether the
    // value passed, so callers can chain dependent checks.

    pub fn required(&mut self, field: &str, value: &str, max_len: usize) -> bool {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, format!("El campo {field} es obligatorio."));
            false
        } else if trimmed.chars().count() > max_len {
            self.add(field, format!("El campo {field} no debe exceder {max_len} caracteres."));
            false
        } else {
            true
        }
    }

    pub fn optional(&mut self, field: &str, value: Option<&str>, max_len: usize) -> bool {
        match value {
            Some(v) if v.trim().chars().count() > max_len => {
                self.add(field, format!("El campo {field} no debe exceder {max_len} caracteres."));
                false
            }
            _ => true,
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Normalize an optional text input: trim, and treat blank as absent
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn is_valid_curp(curp: &str) -> bool {
    CURP_RE.is_match(&curp.trim().to_uppercase())
}

/// `YYYY-MM` with a month between 01 and 12
pub fn is_valid_periodo(periodo: &str) -> bool {
    PERIODO_RE.is_match(periodo)
}

pub fn is_valid_telefono(telefono: &str) -> bool {
    telefono.len() == 10 && telefono.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_codigo_postal(cp: &str) -> bool {
    cp.len() == 5 && cp.chars().all(|c| c.is_ascii_digit())
}

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
