//! Database schema migrations
//!
//! Versioned migrations tracked in the `schema_version` table. Tables are
//! created by `init` with their current shape; migrations carry databases
//! created by older builds forward.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - add a new one for each change
//! 2. **Idempotent** - check before altering; safe to run repeatedly
//! 3. **Use ALTER TABLE** - prefer it over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: reporting indexes
///
/// Enrollment dashboards group by program within a periodo range, and the
/// admin dashboard groups beneficiaries by section.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: reporting indexes");

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_inscripciones_programa_periodo ON inscripciones(programa_id, periodo)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_beneficiarios_seccion ON beneficiarios(seccion_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Migration v2: add `source` to the import staging table
///
/// Staging tables created before batches recorded their origin lack the column.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: import cache source column");

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('beneficiarios_import_cache') WHERE name = 'source'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  source column already exists - skipping");
        return Ok(());
    }

    match sqlx::query("ALTER TABLE beneficiarios_import_cache ADD COLUMN source TEXT")
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("  ✓ Added source column to beneficiarios_import_cache");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            info!("  source column added concurrently - skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
