//! Integration tests for padron-web endpoints
//!
//! Tests cover:
//! - Health endpoint (no acting user required)
//! - Section lookup
//! - Enrollment capture: success, duplicate periodo, unknown section
//! - Program administration: slug derivation, delete guard
//! - Dashboards: enrollment month window, reversed date range
//! - Clerk records listing
//! - Import staging cache
//! - Concurrent duplicate captures
//! - Request bodies that fail to deserialize

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use padron_common::time::{now, quota_window_start, to_db};
use serde_json::json;
use sqlx::SqlitePool;

/// Second active program, not renewable
async fn add_programa_no_renovable(pool: &SqlitePool) {
    sqlx::query(
        "INSERT INTO programas (id, nombre, slug, tipo_periodo, renovable, activo, created_at, updated_at) \
         VALUES (2, 'Becas', 'becas', 'mensual', 0, 1, '2026-01-01 10:00:00', '2026-01-01 10:00:00')",
    )
    .execute(pool)
    .await
    .unwrap();
}

// =============================================================================
// Health and catalog
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_user_required() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let response = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "padron-web");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_seccion_lookup_tolerates_zero_padding() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let response = send(&app, request("GET", "/api/secciones/123", Some(CAPTURISTA), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["found"], true);
    assert_eq!(body["seccional"], "0123");
    assert_eq!(body["municipio"], "Centro");
    assert_eq!(body["distrito_federal"], "DF-02");

    let response = send(&app, request("GET", "/api/secciones/9999", Some(CAPTURISTA), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["found"], false);
}

// =============================================================================
// Enrollment capture
// =============================================================================

#[tokio::test]
async fn test_store_inscripcion_creates_beneficiario_domicilio_and_inscripcion() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let body = inscripcion("loda000101mdflrna2", "2026-01");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "Inscripcion registrada correctamente");
    assert_eq!(body["periodo"], "2026-01");
    assert_eq!(body["estatus"], "inscrito");
    assert_eq!(body["created_by"], CAPTURISTA);

    assert_eq!(count(&pool, "beneficiarios").await, 1);
    assert_eq!(count(&pool, "domicilios").await, 1);
    assert_eq!(count(&pool, "inscripciones").await, 1);

    let (curp, seccion_id, municipio_id): (String, Option<i64>, Option<i64>) =
        sqlx::query_as("SELECT curp, seccion_id, municipio_id FROM beneficiarios")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(curp, "LODA000101MDFLRNA2");
    assert_eq!(seccion_id, Some(1));
    assert_eq!(municipio_id, Some(1));
}

#[tokio::test]
async fn test_store_duplicate_periodo_rejected_without_side_effects() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    let first = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body.clone()))).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let mut again = body;
    again["telefono"] = json!("5599999999");
    let second = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(again))).await;
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(second.into_body()).await;
    assert!(body["errors"]["periodo"].is_array());
    assert_eq!(count(&pool, "inscripciones").await, 1);

    // The rejected request's beneficiary changes were rolled back too
    let telefono: String = sqlx::query_scalar("SELECT telefono FROM beneficiarios")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(telefono, "5512345678");
}

#[tokio::test]
async fn test_store_same_beneficiario_new_periodo_reuses_record() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    for periodo in ["2026-01", "2026-02"] {
        let body = inscripcion("LODA000101MDFLRNA2", periodo);
        let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    assert_eq!(count(&pool, "beneficiarios").await, 1);
    assert_eq!(count(&pool, "domicilios").await, 1);
    assert_eq!(count(&pool, "inscripciones").await, 2);
}

#[tokio::test]
async fn test_store_unknown_seccional_creates_nothing() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let mut body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    body["domicilio"]["seccional"] = json!("9999");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["domicilio.seccional"].is_array());
    assert_eq!(count(&pool, "beneficiarios").await, 0);
    assert_eq!(count(&pool, "domicilios").await, 0);
    assert_eq!(count(&pool, "inscripciones").await, 0);
}

#[tokio::test]
async fn test_store_reports_every_invalid_field() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let body = json!({
        "nombre": "",
        "curp": "XYZ",
        "sexo": "Q",
        "telefono": "123",
        "domicilio": {},
        "periodo": "2026-13",
    });
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let errors = extract_json(response.into_body()).await["errors"].clone();
    for field in [
        "nombre",
        "curp",
        "sexo",
        "telefono",
        "domicilio.seccional",
        "programa_id",
        "periodo",
    ] {
        assert!(errors[field].is_array(), "missing error for {field}: {errors}");
    }
}

#[tokio::test]
async fn test_lista_filters_by_periodo() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    for periodo in ["2026-01", "2026-02"] {
        let body = inscripcion("LODA000101MDFLRNA2", periodo);
        send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    }

    let response = send(
        &app,
        request("GET", "/inscripciones/lista?periodo=2026-02", Some(ADMIN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["periodo"], "2026-02");
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_captures_store_one_inscripcion() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let app = app.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let response =
                    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
                let status = response.status();
                (status, extract_json(response.into_body()).await)
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
            assert!(body["errors"]["periodo"].is_array(), "{body}");
        }
    }

    assert_eq!(created, 1);
    assert_eq!(count(&pool, "beneficiarios").await, 1);
    assert_eq!(count(&pool, "domicilios").await, 1);
    assert_eq!(count(&pool, "inscripciones").await, 1);
}

#[tokio::test]
async fn test_store_folio_owned_by_other_beneficiario_rejected() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let mut first = inscripcion("LODA000101MDFLRNA2", "2026-01");
    first["folio_tarjeta"] = json!("F-100");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(first))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut second = inscripcion("PECL000101HDFLRNA3", "2026-01");
    second["folio_tarjeta"] = json!("F-100");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(second))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["folio_tarjeta"].is_array());
    assert_eq!(count(&pool, "beneficiarios").await, 1);
    assert_eq!(count(&pool, "inscripciones").await, 1);
}

#[tokio::test]
async fn test_store_municipio_must_match_seccional() {
    let (_dir, pool) = setup_db().await;
    sqlx::query("INSERT INTO municipios (id, clave, nombre) VALUES (2, 102, 'Norte')")
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_app(pool.clone());

    let mut body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    body["domicilio"]["municipio_id"] = json!(2);
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body.clone()))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let errors = extract_json(response.into_body()).await["errors"].clone();
    assert!(errors["domicilio.municipio_id"].is_array());
    assert_eq!(count(&pool, "beneficiarios").await, 0);

    body["domicilio"]["municipio_id"] = json!(1);
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_store_renewal_stamped_only_for_renewable_programs() {
    let (_dir, pool) = setup_db().await;
    add_programa_no_renovable(&pool).await;
    let app = setup_app(pool);

    let mut body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    body["renovacion"] = json!(true);
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body.clone()))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert!(created["fecha_renovacion"].is_string());

    body["programa_id"] = json!(2);
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body.clone()))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert!(created["fecha_renovacion"].is_null());

    body["programa_id"] = json!(1);
    body["periodo"] = json!("2026-02");
    body["renovacion"] = json!(false);
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert!(created["fecha_renovacion"].is_null());
}

#[tokio::test]
async fn test_create_context_quota_window_includes_its_start() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    for periodo in ["2026-01", "2026-02"] {
        let body = inscripcion("LODA000101MDFLRNA2", periodo);
        let response =
            send(&app, request("POST", "/inscripciones", Some(CAPTURISTA_PROGRAMAS), Some(body))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let since = quota_window_start(now());
    for (periodo, created_at) in [
        ("2026-01", since),
        ("2026-02", since - chrono::Duration::seconds(1)),
    ] {
        sqlx::query("UPDATE inscripciones SET created_at = ? WHERE periodo = ?")
            .bind(to_db(created_at))
            .bind(periodo)
            .execute(&pool)
            .await
            .unwrap();
    }

    let response = send(&app, request("GET", "/inscripciones/create", Some(CAPTURISTA_PROGRAMAS), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["cuota"]["count"], 1);

    let response = send(&app, request("GET", "/inscripciones/create", Some(CAPTURISTA), None)).await;
    let body = extract_json(response.into_body()).await;
    assert!(body["cuota"].is_null());
}

// =============================================================================
// Program administration
// =============================================================================

#[tokio::test]
async fn test_programa_slug_derived_and_made_unique() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let payload = json!({ "nombre": "Clases de Guitarra", "tipo_periodo": "mensual" });

    let response = send(&app, request("POST", "/programas", Some(ADMIN), Some(payload.clone()))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["slug"], "clases-de-guitarra");
    assert_eq!(body["activo"], true);

    let response = send(&app, request("POST", "/programas", Some(ADMIN), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["slug"], "clases-de-guitarra-1");
}

#[tokio::test]
async fn test_programa_invalid_tipo_periodo_rejected() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let payload = json!({ "nombre": "Becas", "tipo_periodo": "semanal" });
    let response = send(&app, request("POST", "/programas", Some(ADMIN), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["tipo_periodo"].is_array());
}

#[tokio::test]
async fn test_programa_with_inscripciones_cannot_be_deleted() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;

    let response = send(&app, request("DELETE", "/programas/1", Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(count(&pool, "programas").await, 1);

    let response = send(&app, request("DELETE", "/programas/999", Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_programa_explicit_slug_in_use_rejected() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let payload = json!({ "nombre": "Otro Club", "slug": "club-deportivo", "tipo_periodo": "mensual" });
    let response = send(&app, request("POST", "/programas", Some(ADMIN), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["slug"].is_array());
    assert_eq!(count(&pool, "programas").await, 1);

    // A program may keep its own slug on update
    let payload = json!({ "nombre": "Club Deportivo", "slug": "club-deportivo", "tipo_periodo": "mensual" });
    let response = send(&app, request("PUT", "/programas/1", Some(ADMIN), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["slug"], "club-deportivo");
}

// =============================================================================
// Dashboards
// =============================================================================

#[tokio::test]
async fn test_inscripcion_kpis_month_window() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    for periodo in ["2026-01", "2026-02", "2026-05"] {
        let body = inscripcion("LODA000101MDFLRNA2", periodo);
        let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &app,
        request("GET", "/inscripciones/kpis?from=2026-01&to=2026-02", Some(ADMIN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totals"]["total"], 2);
    assert_eq!(body["monthly"]["total"], 2);
    assert_eq!(body["monthly"]["data"], json!([1, 1]));
    assert_eq!(body["byPrograma"]["labels"], json!(["Club Deportivo"]));
    assert_eq!(body["range"]["from"], "2026-01");
    assert_eq!(body["range"]["to"], "2026-02");
}

#[tokio::test]
async fn test_admin_kpis_swaps_reversed_range() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let response = send(
        &app,
        request("GET", "/admin/kpis?from=2026-03-01&to=2026-01-01", Some(ADMIN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["range"]["from"], "2026-01-01");
    assert_eq!(body["range"]["to"], "2026-03-01");
    assert_eq!(body["totals"]["total"], 0);
    assert_eq!(body["ageRange"]["label"], "18-28");
}

#[tokio::test]
async fn test_admin_kpis_invalid_date_rejected() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let response = send(&app, request("GET", "/admin/kpis?from=ayer", Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["from"].is_array());
}

#[tokio::test]
async fn test_admin_kpis_counts_captured_beneficiarios() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;

    let response = send(&app, request("GET", "/admin/kpis", Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totals"]["total"], 1);
    assert_eq!(body["today"]["total"], 1);
    assert_eq!(body["byMunicipio"]["labels"], json!(["Centro"]));
    assert_eq!(body["bySeccional"]["labels"], json!(["0123"]));
    assert_eq!(body["byCapturista"]["labels"], json!(["Carla"]));

    let board = &body["capturistasWeekBoard"];
    assert_eq!(board["labels"].as_array().unwrap().len(), 4);
    let carla = board["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["uuid"] == CAPTURISTA)
        .unwrap();
    assert_eq!(carla["total"], 1);
}

#[tokio::test]
async fn test_capturista_kpis_only_own_records() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;

    let response = send(&app, request("GET", "/capturista/kpis", Some(CAPTURISTA), None)).await;
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["today"], 1);
    assert_eq!(body["ultimos"].as_array().unwrap().len(), 1);

    let response = send(&app, request("GET", "/capturista/kpis", Some(OTRO_CAPTURISTA), None)).await;
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["today"], 0);
    assert!(body["ultimos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_kpis_capturista_filter_spares_board_and_age_range() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    let body = inscripcion("PECL000101HDFLRNA3", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(OTRO_CAPTURISTA), Some(body))).await;

    let uri = format!("/admin/kpis?capturista={OTRO_CAPTURISTA}");
    let response = send(&app, request("GET", &uri, Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totals"]["total"], 1);
    assert_eq!(body["byCapturista"]["labels"], json!(["Cesar"]));
    assert_eq!(body["ageRange"]["total"], 2);

    let rows = body["capturistasWeekBoard"]["rows"].as_array().unwrap();
    for uuid in [CAPTURISTA, OTRO_CAPTURISTA] {
        let row = rows.iter().find(|row| row["uuid"] == uuid).unwrap();
        assert_eq!(row["total"], 1, "week board row for {uuid}");
    }

    let response = send(&app, request("GET", "/admin/kpis?municipio_id=99", Some(ADMIN), None)).await;
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totals"]["total"], 0);
    assert_eq!(body["ageRange"]["total"], 2);
}

#[tokio::test]
async fn test_inscripcion_kpis_programa_filter() {
    let (_dir, pool) = setup_db().await;
    add_programa_no_renovable(&pool).await;
    let app = setup_app(pool);

    for (programa_id, periodo) in [(1, "2026-01"), (1, "2026-02"), (2, "2026-01")] {
        let mut body = inscripcion("LODA000101MDFLRNA2", periodo);
        body["programa_id"] = json!(programa_id);
        let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &app,
        request("GET", "/inscripciones/kpis?from=2026-01&to=2026-02", Some(ADMIN), None),
    )
    .await;
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totals"]["total"], 3);

    let response = send(
        &app,
        request(
            "GET",
            "/inscripciones/kpis?from=2026-01&to=2026-02&programa_id=1",
            Some(ADMIN),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totals"]["total"], 2);
    assert_eq!(body["monthly"]["data"], json!([1, 1]));
}

// =============================================================================
// Clerk records
// =============================================================================

#[tokio::test]
async fn test_mis_registros_lists_own_records_with_tallies() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;

    let response = send(&app, request("GET", "/mis-registros", Some(CAPTURISTA), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["items"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalMonth"], 1);
    assert_eq!(body["femaleCount"], 1);
    assert_eq!(body["maleCount"], 0);
    assert_eq!(body["monthlyCounts"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_mis_registros_other_clerks_record_forbidden() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    let id: String = sqlx::query_scalar("SELECT id FROM beneficiarios")
        .fetch_one(&pool)
        .await
        .unwrap();

    let uri = format!("/mis-registros/{id}");
    let response = send(&app, request("GET", &uri, Some(CAPTURISTA), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["curp"], "LODA000101MDFLRNA2");
    assert_eq!(body["domicilio"]["colonia"], "Centro");

    let response = send(&app, request("GET", &uri, Some(OTRO_CAPTURISTA), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, request("GET", "/mis-registros/nope", Some(CAPTURISTA), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_beneficiario_with_inscripciones_cannot_be_deleted() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    let id: String = sqlx::query_scalar("SELECT id FROM beneficiarios")
        .fetch_one(&pool)
        .await
        .unwrap();

    let uri = format!("/beneficiarios/{id}");
    let response = send(&app, request("DELETE", &uri, Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(count(&pool, "beneficiarios").await, 1);
}

#[tokio::test]
async fn test_mis_registros_update_keeps_folio_set_by_recapture() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    let id = extract_json(response.into_body()).await["beneficiario_id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut recapture = inscripcion("LODA000101MDFLRNA2", "2026-02");
    recapture["folio_tarjeta"] = json!("F-200");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(recapture))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut edit = inscripcion("LODA000101MDFLRNA2", "2026-02");
    edit["telefono"] = json!("5587654321");
    let uri = format!("/mis-registros/{id}");
    let response = send(&app, request("PUT", &uri, Some(CAPTURISTA), Some(edit))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["telefono"], "5587654321");
    assert_eq!(body["folio_tarjeta"], "F-200");
}

// =============================================================================
// Import staging cache
// =============================================================================

#[tokio::test]
async fn test_import_cache_stage_and_fetch() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let payload = json!({
        "source": "tableta-07",
        "beneficiarios": [beneficiario("LODA000101MDFLRNA2")],
    });
    let response = send(
        &app,
        request("POST", "/api/beneficiarios/cache", Some(CAPTURISTA), Some(payload)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 1);
    let key = body["cache_key"].as_str().unwrap().to_string();
    assert!(key.starts_with("beneficiarios.import."));

    let uri = format!("/api/beneficiarios/cache/{key}");
    let response = send(&app, request("GET", &uri, Some(ADMIN), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["source"], "tableta-07");
    assert_eq!(body["submitted_by"], CAPTURISTA);
    assert_eq!(body["beneficiarios"].as_array().unwrap().len(), 1);

    let response = send(
        &app,
        request("GET", "/api/beneficiarios/cache/beneficiarios.import.missing", Some(ADMIN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_cache_rejects_repeated_curp() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let payload = json!({
        "beneficiarios": [
            beneficiario("LODA000101MDFLRNA2"),
            beneficiario("loda000101mdflrna2"),
        ],
    });
    let response = send(
        &app,
        request("POST", "/api/beneficiarios/cache", Some(CAPTURISTA), Some(payload)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["beneficiarios.1.curp"].is_array());
    assert!(body["errors"]["beneficiarios.0.curp"].is_null());
    assert_eq!(count(&pool, "beneficiarios_import_cache").await, 0);
}

// =============================================================================
// Request bodies
// =============================================================================

#[tokio::test]
async fn test_mistyped_field_reported_on_that_field() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool.clone());

    let mut body = inscripcion("LODA000101MDFLRNA2", "2026-01");
    body["programa_id"] = json!("1");
    let response = send(&app, request("POST", "/inscripciones", Some(CAPTURISTA), Some(body))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert!(body["message"].is_string());
    assert!(body["errors"]["programa_id"].is_array(), "{body}");
    assert_eq!(count(&pool, "inscripciones").await, 0);

    let payload = json!({ "nombre": "Becas", "tipo_periodo": "mensual", "renovable": "si" });
    let response = send(&app, request("POST", "/programas", Some(ADMIN), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["renovable"].is_array(), "{body}");
}

#[tokio::test]
async fn test_malformed_json_reported_on_body() {
    let (_dir, pool) = setup_db().await;
    let app = setup_app(pool);

    let malformed = Request::builder()
        .method("POST")
        .uri("/programas")
        .header("x-user-id", ADMIN)
        .header("content-type", "application/json")
        .body(Body::from("{\"nombre\": "))
        .unwrap();
    let response = send(&app, malformed).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["body"].is_array());

    let untyped = Request::builder()
        .method("POST")
        .uri("/programas")
        .header("x-user-id", ADMIN)
        .body(Body::from(json!({ "nombre": "Becas" }).to_string()))
        .unwrap();
    let response = send(&app, untyped).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["errors"]["body"].is_array());
}
