//! Enrollment workflow
//!
//! Registers a beneficiary, their address and one enrollment as a single
//! all-or-nothing unit. Everything after input validation runs inside one
//! SQLite transaction; returning early with an error drops the transaction,
//! which rolls it back.
//!
//! Uniqueness is checked up front for clear messages, but the storage
//! constraints are authoritative: a concurrent writer that slips past a
//! pre-check trips a unique constraint, and `padron_common::Error` turns
//! that into the same field error.

use chrono::NaiveDateTime;
use padron_common::db::{begin_write, Estatus, Inscripcion, Rol};
use padron_common::time::{quota_window_start, Month};
use padron_common::validation::is_valid_periodo;
use padron_common::{Error, FieldErrors, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{beneficiarios, domicilios, inscripciones, programas};
use crate::services::captura::{self, BeneficiarioInput, DomicilioInput};

pub const DUPLICATE_PERIODO_MESSAGE: &str =
    "Ya existe una inscripcion de este beneficiario para el periodo seleccionado.";
pub const DUPLICATE_FOLIO_MESSAGE: &str = "Este folio ya esta registrado.";

/// Enrollment capture form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InscripcionRequest {
    #[serde(flatten)]
    pub beneficiario: BeneficiarioInput,
    #[serde(default)]
    pub domicilio: DomicilioInput,
    #[serde(default)]
    pub programa_id: Option<i64>,
    #[serde(default)]
    pub periodo: String,
    #[serde(default)]
    pub estatus: Option<String>,
    /// Stamp a renewal date (only honored for renewable programs)
    #[serde(default)]
    pub renovacion: bool,
}

/// Enrollment edit form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InscripcionUpdateRequest {
    #[serde(default)]
    pub programa_id: Option<i64>,
    #[serde(default)]
    pub periodo: String,
    #[serde(default)]
    pub estatus: String,
}

fn validate_periodo(periodo: &str, errors: &mut FieldErrors) {
    if errors.required("periodo", periodo, 7) && !is_valid_periodo(periodo.trim()) {
        errors.add("periodo", "El periodo debe tener el formato AAAA-MM.");
    }
}

fn validate_estatus(value: Option<&str>, errors: &mut FieldErrors) -> Estatus {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Estatus::default(),
        Some(v) => Estatus::parse(v).unwrap_or_else(|| {
            errors.add("estatus", "El estatus seleccionado no es valido.");
            Estatus::default()
        }),
    }
}

fn require_programa(programa_id: Option<i64>, errors: &mut FieldErrors) {
    if programa_id.is_none() {
        errors.add("programa_id", "El campo programa_id es obligatorio.");
    }
}

fn programa_missing() -> Error {
    Error::field("programa_id", "El programa seleccionado no existe.")
}

/// Register a beneficiary (created or updated by CURP), their address and
/// an enrollment
pub async fn register(
    pool: &SqlitePool,
    actor_uuid: &str,
    request: InscripcionRequest,
    now: NaiveDateTime,
) -> Result<Inscripcion> {
    let mut errors = FieldErrors::new();
    let captura = captura::validate_captura(
        &request.beneficiario,
        &request.domicilio,
        now.date(),
        &mut errors,
    );
    require_programa(request.programa_id, &mut errors);
    validate_periodo(&request.periodo, &mut errors);
    let estatus = validate_estatus(request.estatus.as_deref(), &mut errors);
    errors.into_result()?;

    let (Some((datos, domicilio)), Some(programa_id)) = (captura, request.programa_id) else {
        return Err(Error::Internal("validated enrollment input incomplete".to_string()));
    };
    let periodo = request.periodo.trim().to_string();

    let mut tx = begin_write(pool).await?;

    let seccion = captura::resolve_seccion(&mut tx, &domicilio).await?;
    let programa = programas::find_by_id(&mut tx, programa_id)
        .await?
        .ok_or_else(programa_missing)?;

    // Find, then branch: update in place or construct new
    let (mut beneficiario, is_new) = match beneficiarios::find_by_curp(&mut tx, &datos.curp).await? {
        Some(mut existing) => {
            datos.apply_to(&mut existing, now);
            (existing, false)
        }
        None => (
            datos.into_new(Uuid::new_v4().to_string(), actor_uuid, now),
            true,
        ),
    };

    if let Some(folio) = &beneficiario.folio_tarjeta {
        let exclude = (!is_new).then_some(beneficiario.id.as_str());
        if beneficiarios::folio_taken(&mut tx, folio, exclude).await? {
            return Err(Error::field("folio_tarjeta", DUPLICATE_FOLIO_MESSAGE));
        }
    }

    beneficiario.seccion_id = Some(seccion.seccion_id);
    beneficiario.municipio_id = Some(seccion.municipio_id);
    if is_new {
        beneficiarios::insert(&mut tx, &beneficiario).await?;
    } else {
        beneficiarios::update(&mut tx, &beneficiario).await?;
    }

    domicilios::upsert(
        &mut tx,
        &beneficiario.id,
        &domicilio.cambios,
        seccion.municipio_id,
        seccion.seccion_id,
        now,
    )
    .await?;

    if inscripciones::triple_exists(&mut tx, &beneficiario.id, programa.id, &periodo, None).await? {
        return Err(Error::field("periodo", DUPLICATE_PERIODO_MESSAGE));
    }

    let inscripcion = Inscripcion {
        id: Uuid::new_v4().to_string(),
        beneficiario_id: beneficiario.id.clone(),
        programa_id: programa.id,
        periodo,
        estatus,
        fecha_renovacion: (request.renovacion && programa.renovable).then_some(now),
        created_by: actor_uuid.to_string(),
        created_at: now,
        updated_at: now,
    };
    inscripciones::insert(&mut tx, &inscripcion).await?;

    tx.commit().await?;

    info!(
        inscripcion = %inscripcion.id,
        beneficiario = %inscripcion.beneficiario_id,
        programa = inscripcion.programa_id,
        periodo = %inscripcion.periodo,
        new_beneficiario = is_new,
        actor = %actor_uuid,
        "Enrollment registered"
    );

    Ok(inscripcion)
}

/// Change program, periodo or status of an existing enrollment
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    request: InscripcionUpdateRequest,
    now: NaiveDateTime,
) -> Result<Inscripcion> {
    let mut errors = FieldErrors::new();
    require_programa(request.programa_id, &mut errors);
    validate_periodo(&request.periodo, &mut errors);
    let estatus = if errors.required("estatus", &request.estatus, 32) {
        validate_estatus(Some(request.estatus.as_str()), &mut errors)
    } else {
        Estatus::default()
    };
    errors.into_result()?;
    let Some(programa_id) = request.programa_id else {
        return Err(programa_missing());
    };
    let periodo = request.periodo.trim();

    let mut tx = begin_write(pool).await?;

    let mut inscripcion = inscripciones::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Inscripcion {id}")))?;
    if programas::find_by_id(&mut tx, programa_id).await?.is_none() {
        return Err(programa_missing());
    }

    if inscripciones::triple_exists(
        &mut tx,
        &inscripcion.beneficiario_id,
        programa_id,
        periodo,
        Some(id),
    )
    .await?
    {
        return Err(Error::field(
            "periodo",
            "Ya existe una inscripcion para ese periodo y programa.",
        ));
    }

    inscripciones::update(&mut tx, id, programa_id, periodo, estatus, now).await?;
    tx.commit().await?;

    inscripcion.programa_id = programa_id;
    inscripcion.periodo = periodo.to_string();
    inscripcion.estatus = estatus;
    inscripcion.updated_at = now;
    debug!(inscripcion = %id, "Enrollment updated");

    Ok(inscripcion)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut conn = pool.acquire().await?;
    if !inscripciones::delete(&mut conn, id).await? {
        return Err(Error::NotFound(format!("Inscripcion {id}")));
    }
    info!(inscripcion = %id, "Enrollment deleted");
    Ok(())
}

/// Capture-quota reading for program clerks
#[derive(Debug, Clone, Serialize)]
pub struct CuotaDiaria {
    pub count: i64,
    pub since: NaiveDateTime,
}

/// Enrollments the clerk created since the quota window opened (today 00:01,
/// or yesterday 00:01 before that). Only program clerks have a quota.
pub async fn daily_quota(
    pool: &SqlitePool,
    actor_uuid: &str,
    role: Rol,
    now: NaiveDateTime,
) -> Result<Option<CuotaDiaria>> {
    if role != Rol::CapturistaProgramas {
        return Ok(None);
    }
    let since = quota_window_start(now);
    let count = inscripciones::count_created_between(pool, actor_uuid, since, now).await?;
    Ok(Some(CuotaDiaria { count, since }))
}

/// Periodo token new enrollments default to
pub fn current_periodo(now: NaiveDateTime) -> String {
    Month::of(now.date()).to_string()
}
