//! Database models

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Rol {
    Admin,
    Capturista,
    CapturistaProgramas,
}

impl Rol {
    pub fn as_str(self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Capturista => "capturista",
            Rol::CapturistaProgramas => "capturista_programas",
        }
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Sexo {
    M,
    F,
    X,
}

impl Sexo {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "M" => Some(Sexo::M),
            "F" => Some(Sexo::F),
            "X" => Some(Sexo::X),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Estatus {
    #[default]
    Inscrito,
    Baja,
    ListaEspera,
}

impl Estatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "inscrito" => Some(Estatus::Inscrito),
            "baja" => Some(Estatus::Baja),
            "lista_espera" => Some(Estatus::ListaEspera),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Estatus::Inscrito => "inscrito",
            Estatus::Baja => "baja",
            Estatus::ListaEspera => "lista_espera",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TipoPeriodo {
    #[default]
    Mensual,
    Unico,
    Anual,
}

impl TipoPeriodo {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "mensual" => Some(TipoPeriodo::Mensual),
            "unico" => Some(TipoPeriodo::Unico),
            "anual" => Some(TipoPeriodo::Anual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Usuario {
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub role: Rol,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Municipio {
    pub id: i64,
    pub clave: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Seccion {
    pub id: i64,
    pub seccional: String,
    pub municipio_id: i64,
    pub distrito_local: Option<String>,
    pub distrito_federal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Beneficiario {
    pub id: String,
    pub folio_tarjeta: Option<String>,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub curp: String,
    pub fecha_nacimiento: NaiveDate,
    pub edad: i64,
    pub sexo: Sexo,
    pub discapacidad: bool,
    pub id_ine: String,
    pub telefono: String,
    pub municipio_id: Option<i64>,
    pub seccion_id: Option<i64>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Domicilio {
    pub id: String,
    pub beneficiario_id: String,
    pub calle: Option<String>,
    pub numero_ext: Option<String>,
    pub numero_int: Option<String>,
    pub colonia: Option<String>,
    pub codigo_postal: Option<String>,
    pub municipio_id: Option<i64>,
    pub seccion_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Programa {
    pub id: i64,
    pub nombre: String,
    pub slug: String,
    pub tipo_periodo: TipoPeriodo,
    pub renovable: bool,
    pub activo: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Inscripcion {
    pub id: String,
    pub beneficiario_id: String,
    pub programa_id: i64,
    pub periodo: String,
    pub estatus: Estatus,
    pub fecha_renovacion: Option<NaiveDateTime>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Staged bulk beneficiary batch awaiting deferred import
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImportCacheEntry {
    pub cache_key: String,
    /// JSON document: `{source, submitted_by, received_at, beneficiarios}`
    pub payload: String,
    pub submitted_by: Option<String>,
    pub source: Option<String>,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
