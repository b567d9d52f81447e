//! Shared helpers for padron-web integration tests

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use padron_common::config::OcrConfig;
use padron_common::db::init_database;
use padron_web::services::ocr_client::OcrClient;
use padron_web::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const ADMIN: &str = "admin-1";
pub const CAPTURISTA: &str = "cap-1";
pub const OTRO_CAPTURISTA: &str = "cap-2";
pub const CAPTURISTA_PROGRAMAS: &str = "prog-1";

/// Fresh database with users, one municipality, one section and one program
pub async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("padron.db")).await.unwrap();

    for (uuid, name, role) in [
        (ADMIN, "Admin", "admin"),
        (CAPTURISTA, "Carla", "capturista"),
        (OTRO_CAPTURISTA, "Cesar", "capturista"),
        (CAPTURISTA_PROGRAMAS, "Pia", "capturista_programas"),
    ] {
        sqlx::query("INSERT INTO users (uuid, name, email, role) VALUES (?, ?, ?, ?)")
            .bind(uuid)
            .bind(name)
            .bind(format!("{uuid}@example.com"))
            .bind(role)
            .execute(&pool)
            .await
            .unwrap();
    }

    sqlx::query("INSERT INTO municipios (id, clave, nombre) VALUES (1, 101, 'Centro')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO secciones (id, seccional, municipio_id, distrito_local, distrito_federal) \
         VALUES (1, '0123', 1, 'DL-01', 'DF-02')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO programas (id, nombre, slug, tipo_periodo, renovable, activo, created_at, updated_at) \
         VALUES (1, 'Club Deportivo', 'club-deportivo', 'mensual', 1, 1, '2026-01-01 10:00:00', '2026-01-01 10:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    (dir, pool)
}

/// Router whose OCR client points at `ocr_url`
pub fn setup_app_with_ocr(pool: SqlitePool, ocr_url: &str) -> Router {
    let config = OcrConfig {
        url: ocr_url.to_string(),
        api_key: None,
        timeout: Duration::from_secs(5),
    };
    let ocr = OcrClient::new(&config).unwrap();
    build_router(AppState::new(pool, ocr))
}

pub fn setup_app(pool: SqlitePool) -> Router {
    setup_app_with_ocr(pool, "http://127.0.0.1:9")
}

pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Valid beneficiary fields without address
pub fn beneficiario(curp: &str) -> Value {
    json!({
        "nombre": "Ana",
        "apellido_paterno": "Lopez",
        "apellido_materno": "Diaz",
        "curp": curp,
        "fecha_nacimiento": "2000-01-01",
        "sexo": "F",
        "discapacidad": false,
        "id_ine": "INE0001",
        "telefono": "5512345678",
    })
}

/// Valid enrollment capture for section 123 and program 1
pub fn inscripcion(curp: &str, periodo: &str) -> Value {
    let mut body = beneficiario(curp);
    body["domicilio"] = json!({
        "calle": "Hidalgo",
        "numero_ext": "12",
        "colonia": "Centro",
        "codigo_postal": "86000",
        "seccional": "123",
    });
    body["programa_id"] = json!(1);
    body["periodo"] = json!(periodo);
    body
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
