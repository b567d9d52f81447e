//! Program administration

use chrono::NaiveDateTime;
use padron_common::db::{begin_write, Programa, TipoPeriodo};
use padron_common::validation::non_blank;
use padron_common::{Error, FieldErrors, Result};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::db::programas::{self, ProgramaDatos};
use crate::services::slug::unique_slug;

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramaRequest {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub tipo_periodo: String,
    #[serde(default)]
    pub renovable: bool,
    #[serde(default = "default_activo")]
    pub activo: bool,
}

fn default_activo() -> bool {
    true
}

pub const DUPLICATE_SLUG_MESSAGE: &str = "El slug ya esta en uso.";

/// A submitted slug must be free as typed; only slugs derived from the name
/// get a numeric suffix
async fn check_explicit_slug(
    conn: &mut SqliteConnection,
    slug: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<()> {
    if let Some(slug) = slug {
        if programas::slug_taken(conn, slug, exclude_id).await? {
            return Err(Error::field("slug", DUPLICATE_SLUG_MESSAGE));
        }
    }
    Ok(())
}

struct Validated {
    nombre: String,
    slug: Option<String>,
    tipo_periodo: TipoPeriodo,
}

impl ProgramaRequest {
    fn validate(&self) -> Result<Validated> {
        let mut errors = FieldErrors::new();
        errors.required("nombre", &self.nombre, 255);
        errors.optional("slug", self.slug.as_deref(), 255);
        let tipo_periodo = if errors.required("tipo_periodo", &self.tipo_periodo, 32) {
            TipoPeriodo::parse(&self.tipo_periodo)
        } else {
            None
        };
        if tipo_periodo.is_none() && !errors.contains("tipo_periodo") {
            errors.add("tipo_periodo", "El tipo de periodo debe ser mensual, unico o anual.");
        }
        errors.into_result()?;

        Ok(Validated {
            nombre: self.nombre.trim().to_string(),
            slug: non_blank(self.slug.as_deref()),
            tipo_periodo: tipo_periodo.unwrap_or_default(),
        })
    }
}

/// Create a program, deriving a free slug
pub async fn create(
    pool: &SqlitePool,
    request: ProgramaRequest,
    now: NaiveDateTime,
) -> Result<Programa> {
    let valid = request.validate()?;

    let mut tx = begin_write(pool).await?;
    check_explicit_slug(&mut tx, valid.slug.as_deref(), None).await?;
    let slug = unique_slug(&mut tx, valid.slug.as_deref(), &valid.nombre, None).await?;
    let datos = ProgramaDatos {
        nombre: valid.nombre,
        slug,
        tipo_periodo: valid.tipo_periodo,
        renovable: request.renovable,
        activo: request.activo,
    };
    let id = programas::insert(&mut tx, &datos, now).await?;
    let programa = programas::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("programa {id} missing after insert")))?;
    tx.commit().await?;

    info!(programa = id, slug = %programa.slug, "Program created");
    Ok(programa)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    request: ProgramaRequest,
    now: NaiveDateTime,
) -> Result<Programa> {
    let valid = request.validate()?;

    let mut tx = begin_write(pool).await?;
    if programas::find_by_id(&mut tx, id).await?.is_none() {
        return Err(Error::NotFound(format!("Programa {id}")));
    }
    check_explicit_slug(&mut tx, valid.slug.as_deref(), Some(id)).await?;
    let slug = unique_slug(&mut tx, valid.slug.as_deref(), &valid.nombre, Some(id)).await?;
    let datos = ProgramaDatos {
        nombre: valid.nombre,
        slug,
        tipo_periodo: valid.tipo_periodo,
        renovable: request.renovable,
        activo: request.activo,
    };
    programas::update(&mut tx, id, &datos, now).await?;
    let programa = programas::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Programa {id}")))?;
    tx.commit().await?;

    info!(programa = id, slug = %programa.slug, "Program updated");
    Ok(programa)
}

/// Delete a program; refused while enrollments reference it
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = begin_write(pool).await?;
    if programas::has_inscripciones(&mut tx, id).await? {
        return Err(Error::Conflict(
            "El programa tiene inscripciones registradas y no puede eliminarse.".to_string(),
        ));
    }
    if !programas::delete(&mut tx, id).await? {
        return Err(Error::NotFound(format!("Programa {id}")));
    }
    tx.commit().await?;

    info!(programa = id, "Program deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(nombre: &str, tipo: &str) -> ProgramaRequest {
        ProgramaRequest {
            nombre: nombre.to_string(),
            slug: None,
            tipo_periodo: tipo.to_string(),
            renovable: false,
            activo: true,
        }
    }

    #[test]
    fn test_validate_accepts_known_period_types() {
        for tipo in ["mensual", "unico", "anual"] {
            assert!(request("Becas", tipo).validate().is_ok());
        }
    }

    #[test]
    fn test_validate_reports_fields() {
        let Err(Error::Validation(errors)) = request(" ", "semanal").validate() else {
            panic!("expected validation error");
        };
        assert!(errors.contains("nombre"));
        assert!(errors.contains("tipo_periodo"));
    }

    #[test]
    fn test_activo_defaults_to_true() {
        let parsed: ProgramaRequest =
            serde_json::from_str(r#"{"nombre":"Becas","tipo_periodo":"anual"}"#).unwrap();
        assert!(parsed.activo);
        assert!(!parsed.renovable);
    }
}
