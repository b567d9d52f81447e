//! Database initialization
//!
//! Opens (creating if needed) the SQLite database, creates every table
//! idempotently, then runs versioned migrations.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go on the connect options so every pooled connection gets them;
    // foreign keys in particular are per-connection in SQLite.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema_version_table(&pool).await?;
    create_users_table(&pool).await?;
    create_catalog_tables(&pool).await?;
    create_beneficiarios_table(&pool).await?;
    create_domicilios_table(&pool).await?;
    create_programas_table(&pool).await?;
    create_inscripciones_table(&pool).await?;
    create_import_cache_table(&pool).await?;

    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Begin a transaction that holds the write lock from its first statement.
///
/// Deferred transactions that read before writing fail with
/// `SQLITE_BUSY_SNAPSHOT` when another writer commits in between, and the
/// busy timeout does not retry that case. Taking the lock up front makes
/// concurrent writers queue instead, so uniqueness pre-checks see every
/// committed row.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Clerk and admin accounts. Managed outside this service; referenced for
/// attribution and role checks.
async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL CHECK (role IN ('admin', 'capturista', 'capturista_programas')),
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Geographic catalog: municipalities and electoral sections
async fn create_catalog_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS municipios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            clave INTEGER NOT NULL UNIQUE,
            nombre TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS secciones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            seccional TEXT NOT NULL UNIQUE,
            municipio_id INTEGER NOT NULL REFERENCES municipios(id),
            distrito_local TEXT,
            distrito_federal TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_beneficiarios_table(pool: &SqlitePool) -> Result<()> {
    // folio_tarjeta: NULLs never collide under a SQLite UNIQUE constraint
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS beneficiarios (
            id TEXT PRIMARY KEY,
            folio_tarjeta TEXT UNIQUE,
            nombre TEXT NOT NULL,
            apellido_paterno TEXT NOT NULL,
            apellido_materno TEXT NOT NULL,
            curp TEXT NOT NULL UNIQUE,
            fecha_nacimiento TEXT NOT NULL,
            edad INTEGER NOT NULL DEFAULT 0,
            sexo TEXT NOT NULL CHECK (sexo IN ('M', 'F', 'X')),
            discapacidad INTEGER NOT NULL DEFAULT 0,
            id_ine TEXT NOT NULL,
            telefono TEXT NOT NULL,
            municipio_id INTEGER REFERENCES municipios(id),
            seccion_id INTEGER REFERENCES secciones(id),
            created_by TEXT NOT NULL REFERENCES users(uuid) ON UPDATE CASCADE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_beneficiarios_created_by ON beneficiarios(created_by, created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_domicilios_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS domicilios (
            id TEXT PRIMARY KEY,
            beneficiario_id TEXT NOT NULL UNIQUE REFERENCES beneficiarios(id) ON DELETE CASCADE,
            calle TEXT,
            numero_ext TEXT,
            numero_int TEXT,
            colonia TEXT,
            codigo_postal TEXT,
            municipio_id INTEGER REFERENCES municipios(id),
            seccion_id INTEGER REFERENCES secciones(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_programas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS programas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            tipo_periodo TEXT NOT NULL DEFAULT 'mensual' CHECK (tipo_periodo IN ('mensual', 'unico', 'anual')),
            renovable INTEGER NOT NULL DEFAULT 0,
            activo INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_inscripciones_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inscripciones (
            id TEXT PRIMARY KEY,
            beneficiario_id TEXT NOT NULL REFERENCES beneficiarios(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            programa_id INTEGER NOT NULL REFERENCES programas(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            periodo TEXT NOT NULL,
            estatus TEXT NOT NULL DEFAULT 'inscrito' CHECK (estatus IN ('inscrito', 'baja', 'lista_espera')),
            fecha_renovacion TEXT,
            created_by TEXT NOT NULL REFERENCES users(uuid) ON UPDATE CASCADE ON DELETE RESTRICT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (beneficiario_id, programa_id, periodo)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Staging area for bulk beneficiary batches awaiting deferred import
async fn create_import_cache_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS beneficiarios_import_cache (
            cache_key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            submitted_by TEXT,
            source TEXT,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
