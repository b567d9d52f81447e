//! Beneficiary and address capture input
//!
//! Shared by enrollment, profile edit and bulk staging: shape validation
//! that collects every field error at once, and section resolution.

use chrono::{NaiveDate, NaiveDateTime};
use padron_common::db::{Beneficiario, Sexo};
use padron_common::time::age_on;
use padron_common::validation::{
    is_valid_codigo_postal, is_valid_curp, is_valid_telefono, non_blank, parse_iso_date,
};
use padron_common::{Error, FieldErrors, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::db::catalog::{self, SeccionResuelta};
use crate::db::domicilios::DomicilioCambios;

const MAX_TEXT: usize = 255;

/// Personal fields as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeneficiarioInput {
    #[serde(default)]
    pub folio_tarjeta: Option<String>,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido_paterno: String,
    #[serde(default)]
    pub apellido_materno: String,
    #[serde(default)]
    pub curp: String,
    #[serde(default)]
    pub fecha_nacimiento: String,
    #[serde(default)]
    pub sexo: String,
    #[serde(default)]
    pub discapacidad: bool,
    #[serde(default)]
    pub id_ine: String,
    #[serde(default)]
    pub telefono: String,
}

/// Personal fields after validation and normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiarioDatos {
    pub folio_tarjeta: Option<String>,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    /// Upper-cased
    pub curp: String,
    pub fecha_nacimiento: NaiveDate,
    pub sexo: Sexo,
    pub discapacidad: bool,
    pub id_ine: String,
    pub telefono: String,
}

impl BeneficiarioInput {
    pub fn validate(&self, today: NaiveDate) -> std::result::Result<BeneficiarioDatos, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.optional("folio_tarjeta", self.folio_tarjeta.as_deref(), MAX_TEXT);
        errors.required("nombre", &self.nombre, MAX_TEXT);
        errors.required("apellido_paterno", &self.apellido_paterno, MAX_TEXT);
        errors.required("apellido_materno", &self.apellido_materno, MAX_TEXT);
        errors.required("id_ine", &self.id_ine, MAX_TEXT);

        let curp = self.curp.trim().to_uppercase();
        if errors.required("curp", &curp, 18) && !is_valid_curp(&curp) {
            errors.add("curp", "El formato de la CURP no es valido.");
        }

        let fecha_nacimiento = if errors.required("fecha_nacimiento", &self.fecha_nacimiento, MAX_TEXT) {
            match parse_iso_date(&self.fecha_nacimiento) {
                Some(date) if date > today => {
                    errors.add("fecha_nacimiento", "La fecha de nacimiento no puede ser futura.");
                    None
                }
                Some(date) => Some(date),
                None => {
                    errors.add("fecha_nacimiento", "La fecha de nacimiento no es una fecha valida.");
                    None
                }
            }
        } else {
            None
        };

        let sexo = Sexo::parse(&self.sexo);
        if sexo.is_none() {
            errors.add("sexo", "El campo sexo debe ser M, F o X.");
        }

        let telefono = self.telefono.trim();
        if errors.required("telefono", telefono, MAX_TEXT) && !is_valid_telefono(telefono) {
            errors.add("telefono", "El telefono debe tener 10 digitos.");
        }

        match (errors.is_empty(), fecha_nacimiento, sexo) {
            (true, Some(fecha_nacimiento), Some(sexo)) => Ok(BeneficiarioDatos {
                folio_tarjeta: non_blank(self.folio_tarjeta.as_deref()),
                nombre: self.nombre.trim().to_string(),
                apellido_paterno: self.apellido_paterno.trim().to_string(),
                apellido_materno: self.apellido_materno.trim().to_string(),
                curp,
                fecha_nacimiento,
                sexo,
                discapacidad: self.discapacidad,
                id_ine: self.id_ine.trim().to_string(),
                telefono: telefono.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

impl BeneficiarioDatos {
    /// Write these fields onto `beneficiario`, recomputing its age.
    ///
    /// An absent folio leaves the stored one in place.
    pub fn apply_to(&self, beneficiario: &mut Beneficiario, now: NaiveDateTime) {
        if let Some(folio) = &self.folio_tarjeta {
            beneficiario.folio_tarjeta = Some(folio.clone());
        }
        beneficiario.nombre = self.nombre.clone();
        beneficiario.apellido_paterno = self.apellido_paterno.clone();
        beneficiario.apellido_materno = self.apellido_materno.clone();
        beneficiario.curp = self.curp.clone();
        beneficiario.fecha_nacimiento = self.fecha_nacimiento;
        beneficiario.edad = age_on(self.fecha_nacimiento, now.date());
        beneficiario.sexo = self.sexo;
        beneficiario.discapacidad = self.discapacidad;
        beneficiario.id_ine = self.id_ine.clone();
        beneficiario.telefono = self.telefono.clone();
        beneficiario.updated_at = now;
    }

    /// A brand-new beneficiary with a fresh id, attributed to `created_by`
    pub fn into_new(self, id: String, created_by: &str, now: NaiveDateTime) -> Beneficiario {
        let mut beneficiario = Beneficiario {
            id,
            folio_tarjeta: None,
            nombre: String::new(),
            apellido_paterno: String::new(),
            apellido_materno: String::new(),
            curp: String::new(),
            fecha_nacimiento: self.fecha_nacimiento,
            edad: 0,
            sexo: self.sexo,
            discapacidad: false,
            id_ine: String::new(),
            telefono: String::new(),
            municipio_id: None,
            seccion_id: None,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.apply_to(&mut beneficiario, now);
        beneficiario
    }
}

/// Address fields as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomicilioInput {
    #[serde(default)]
    pub calle: Option<String>,
    #[serde(default)]
    pub numero_ext: Option<String>,
    #[serde(default)]
    pub numero_int: Option<String>,
    #[serde(default)]
    pub colonia: Option<String>,
    #[serde(default)]
    pub codigo_postal: Option<String>,
    #[serde(default)]
    pub seccional: Option<String>,
    #[serde(default)]
    pub municipio_id: Option<i64>,
}

/// Address after validation; municipality still to be checked against the section
#[derive(Debug, Clone)]
pub struct DomicilioDatos {
    pub cambios: DomicilioCambios,
    pub seccional: String,
    pub municipio_id: Option<i64>,
}

impl DomicilioInput {
    /// Errors are keyed by bare field name; callers prefix them with `domicilio`
    pub fn validate(&self) -> std::result::Result<DomicilioDatos, FieldErrors> {
        let mut errors = FieldErrors::new();

        let seccional = self.seccional.as_deref().unwrap_or_default();
        errors.required("seccional", seccional, MAX_TEXT);

        for (field, value) in [
            ("calle", &self.calle),
            ("numero_ext", &self.numero_ext),
            ("numero_int", &self.numero_int),
            ("colonia", &self.colonia),
        ] {
            errors.optional(field, value.as_deref(), MAX_TEXT);
        }

        let codigo_postal = non_blank(self.codigo_postal.as_deref());
        if let Some(cp) = &codigo_postal {
            if !is_valid_codigo_postal(cp) {
                errors.add("codigo_postal", "El codigo postal debe tener 5 digitos.");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(DomicilioDatos {
            cambios: DomicilioCambios {
                calle: non_blank(self.calle.as_deref()),
                numero_ext: non_blank(self.numero_ext.as_deref()),
                numero_int: non_blank(self.numero_int.as_deref()),
                colonia: non_blank(self.colonia.as_deref()),
                codigo_postal,
            },
            seccional: seccional.trim().to_string(),
            municipio_id: self.municipio_id,
        })
    }
}

/// Validate a beneficiary and its address together, reporting all errors at once
pub fn validate_captura(
    beneficiario: &BeneficiarioInput,
    domicilio: &DomicilioInput,
    today: NaiveDate,
    errors: &mut FieldErrors,
) -> Option<(BeneficiarioDatos, DomicilioDatos)> {
    let personal = beneficiario.validate(today);
    let address = domicilio.validate();

    match (personal, address) {
        (Ok(personal), Ok(address)) => Some((personal, address)),
        (personal, address) => {
            if let Err(e) = personal {
                errors.merge(e);
            }
            if let Err(e) = address {
                errors.merge_prefixed("domicilio", e);
            }
            None
        }
    }
}

/// Resolve the address's section and check any explicit municipality against it
pub async fn resolve_seccion(
    conn: &mut SqliteConnection,
    domicilio: &DomicilioDatos,
) -> Result<SeccionResuelta> {
    let seccion = catalog::resolve_seccion(conn, &domicilio.seccional)
        .await?
        .ok_or_else(|| {
            Error::field("domicilio.seccional", "La seccional no se encuentra en el catalogo.")
        })?;

    if let Some(municipio_id) = domicilio.municipio_id {
        if municipio_id != seccion.municipio_id {
            return Err(Error::field(
                "domicilio.municipio_id",
                "El municipio no coincide con la seccional seleccionada.",
            ));
        }
    }

    Ok(seccion)
}
