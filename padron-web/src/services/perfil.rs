//! Beneficiary profile edit and removal

use chrono::NaiveDateTime;
use padron_common::db::{begin_write, Beneficiario, Domicilio};
use padron_common::{Error, FieldErrors, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{beneficiarios, domicilios};
use crate::services::captura::{self, BeneficiarioInput, DomicilioInput};
use crate::services::enrollment::DUPLICATE_FOLIO_MESSAGE;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerfilRequest {
    #[serde(flatten)]
    pub beneficiario: BeneficiarioInput,
    #[serde(default)]
    pub domicilio: DomicilioInput,
}

/// Beneficiary with its address
#[derive(Debug, Clone, Serialize)]
pub struct Perfil {
    #[serde(flatten)]
    pub beneficiario: Beneficiario,
    pub domicilio: Option<Domicilio>,
}

pub async fn load(pool: &SqlitePool, id: &str) -> Result<Option<Perfil>> {
    let mut conn = pool.acquire().await?;
    let Some(beneficiario) = beneficiarios::find_by_id(&mut conn, id).await? else {
        return Ok(None);
    };
    let domicilio = domicilios::find_by_beneficiario(&mut conn, id).await?;
    Ok(Some(Perfil {
        beneficiario,
        domicilio,
    }))
}

/// Update personal fields and address of beneficiary `id` in one transaction.
///
/// The stored row is read under the write lock, so fields the request leaves
/// out keep their committed values.
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    request: PerfilRequest,
    now: NaiveDateTime,
) -> Result<Perfil> {
    let mut errors = FieldErrors::new();
    let captura = captura::validate_captura(
        &request.beneficiario,
        &request.domicilio,
        now.date(),
        &mut errors,
    );
    errors.into_result()?;
    let Some((datos, domicilio)) = captura else {
        return Err(Error::Internal("validated profile input incomplete".to_string()));
    };

    let mut tx = begin_write(pool).await?;

    let mut beneficiario = beneficiarios::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Beneficiario {id}")))?;
    let seccion = captura::resolve_seccion(&mut tx, &domicilio).await?;

    if beneficiarios::curp_taken(&mut tx, &datos.curp, Some(&beneficiario.id)).await? {
        return Err(Error::field("curp", "La CURP ya esta registrada."));
    }
    if let Some(folio) = &datos.folio_tarjeta {
        if beneficiarios::folio_taken(&mut tx, folio, Some(&beneficiario.id)).await? {
            return Err(Error::field("folio_tarjeta", DUPLICATE_FOLIO_MESSAGE));
        }
    }

    datos.apply_to(&mut beneficiario, now);
    beneficiario.seccion_id = Some(seccion.seccion_id);
    beneficiario.municipio_id = Some(seccion.municipio_id);
    beneficiarios::update(&mut tx, &beneficiario).await?;

    domicilios::upsert(
        &mut tx,
        &beneficiario.id,
        &domicilio.cambios,
        seccion.municipio_id,
        seccion.seccion_id,
        now,
    )
    .await?;
    let domicilio = domicilios::find_by_beneficiario(&mut tx, &beneficiario.id).await?;

    tx.commit().await?;
    info!(beneficiario = %beneficiario.id, "Beneficiary profile updated");

    Ok(Perfil {
        beneficiario,
        domicilio,
    })
}

/// Delete a beneficiary and their address; refused while enrollments exist
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = begin_write(pool).await?;

    if beneficiarios::has_inscripciones(&mut tx, id).await? {
        return Err(Error::Conflict(
            "El beneficiario tiene inscripciones registradas y no puede eliminarse.".to_string(),
        ));
    }
    if !beneficiarios::delete(&mut tx, id).await? {
        return Err(Error::NotFound(format!("Beneficiario {id}")));
    }

    tx.commit().await?;
    info!(beneficiario = %id, "Beneficiary deleted");
    Ok(())
}
