//! Staging table for bulk beneficiary batches

use chrono::NaiveDateTime;
use padron_common::db::ImportCacheEntry;
use padron_common::time::to_db;
use padron_common::Result;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

/// Drop entries whose expiry has passed
pub async fn purge_expired(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<u64> {
    let result = sqlx::query("DELETE FROM beneficiarios_import_cache WHERE expires_at <= ?")
        .bind(to_db(now))
        .execute(conn)
        .await?;
    if result.rows_affected() > 0 {
        debug!(purged = result.rows_affected(), "Purged expired import batches");
    }
    Ok(result.rows_affected())
}

pub async fn insert(conn: &mut SqliteConnection, entry: &ImportCacheEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO beneficiarios_import_cache
            (cache_key, payload, submitted_by, source, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.cache_key)
    .bind(&entry.payload)
    .bind(&entry.submitted_by)
    .bind(&entry.source)
    .bind(to_db(entry.created_at))
    .bind(to_db(entry.expires_at))
    .execute(conn)
    .await?;
    Ok(())
}

/// Entry for `cache_key` unless it has expired
pub async fn find_active(
    pool: &SqlitePool,
    cache_key: &str,
    now: NaiveDateTime,
) -> Result<Option<ImportCacheEntry>> {
    let entry = sqlx::query_as::<_, ImportCacheEntry>(
        r#"
        SELECT cache_key, payload, submitted_by, source, created_at, expires_at
        FROM beneficiarios_import_cache
        WHERE cache_key = ? AND expires_at > ?
        "#,
    )
    .bind(cache_key)
    .bind(to_db(now))
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}
