//! Bulk beneficiary staging
//!
//! A batch is validated item by item with the single-capture rules, then
//! parked in `beneficiarios_import_cache` for 24 hours under an opaque key.
//! Nothing reaches the beneficiary tables from here.

use chrono::{Duration, NaiveDateTime};
use padron_common::db::{begin_write, ImportCacheEntry};
use padron_common::validation::non_blank;
use padron_common::{Error, FieldErrors, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::db::import_cache;
use crate::services::captura::{BeneficiarioInput, DomicilioInput};

pub const CACHE_KEY_PREFIX: &str = "beneficiarios.import.";
pub const CACHE_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub beneficiarios: Option<Vec<Value>>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One staged record: personal fields plus an optional address
#[derive(Debug, Clone, Default, Deserialize)]
struct ImportItem {
    #[serde(flatten)]
    beneficiario: BeneficiarioInput,
    #[serde(default)]
    domicilio: Option<DomicilioInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedBatch {
    pub cache_key: String,
    pub expires_at: NaiveDateTime,
    pub count: usize,
}

/// Validate every record, keying errors as `beneficiarios.{index}.{field}`
fn validate_batch(items: &[Value], now: NaiveDateTime) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let mut curps: HashMap<String, usize> = HashMap::new();
    let mut folios: HashMap<String, usize> = HashMap::new();

    for (index, raw) in items.iter().enumerate() {
        let prefix = format!("beneficiarios.{index}");
        let item: ImportItem = match serde_json::from_value(raw.clone()) {
            Ok(item) => item,
            Err(_) => {
                errors.add(prefix, "El registro no tiene un formato valido.");
                continue;
            }
        };

        if let Err(e) = item.beneficiario.validate(now.date()) {
            errors.merge_prefixed(&prefix, e);
        }
        if let Some(domicilio) = &item.domicilio {
            if let Err(e) = domicilio.validate() {
                errors.merge_prefixed(&format!("{prefix}.domicilio"), e);
            }
        }

        let curp = item.beneficiario.curp.trim().to_uppercase();
        if !curp.is_empty() {
            if let Some(first) = curps.get(&curp) {
                errors.add(
                    format!("{prefix}.curp"),
                    format!("La CURP se repite en el registro {first}."),
                );
            } else {
                curps.insert(curp, index);
            }
        }

        if let Some(folio) = non_blank(item.beneficiario.folio_tarjeta.as_deref()) {
            if let Some(first) = folios.get(&folio) {
                errors.add(
                    format!("{prefix}.folio_tarjeta"),
                    format!("El folio se repite en el registro {first}."),
                );
            } else {
                folios.insert(folio, index);
            }
        }
    }

    errors
}

/// Validate and stage a batch; returns its key, expiry and size
pub async fn stage(
    pool: &SqlitePool,
    actor_uuid: &str,
    request: ImportRequest,
    now: NaiveDateTime,
) -> Result<StagedBatch> {
    let mut errors = FieldErrors::new();
    let beneficiarios = request.beneficiarios.unwrap_or_default();
    if beneficiarios.is_empty() {
        errors.add("beneficiarios", "El campo beneficiarios es obligatorio.");
    }
    errors.optional("source", request.source.as_deref(), 255);
    errors.merge(validate_batch(&beneficiarios, now));
    errors.into_result()?;

    let source = non_blank(request.source.as_deref());
    let cache_key = format!("{CACHE_KEY_PREFIX}{}", Uuid::new_v4());
    let expires_at = now + Duration::seconds(CACHE_TTL_SECS);
    let count = beneficiarios.len();

    let payload = json!({
        "source": source,
        "submitted_by": actor_uuid,
        "received_at": now,
        "beneficiarios": beneficiarios,
    });
    let payload =
        serde_json::to_string(&payload).map_err(|e| Error::Internal(e.to_string()))?;

    let entry = ImportCacheEntry {
        cache_key: cache_key.clone(),
        payload,
        submitted_by: Some(actor_uuid.to_string()),
        source,
        created_at: now,
        expires_at,
    };

    let mut tx = begin_write(pool).await?;
    import_cache::purge_expired(&mut tx, now).await?;
    import_cache::insert(&mut tx, &entry).await?;
    tx.commit().await?;

    info!(cache_key = %cache_key, count, actor = %actor_uuid, "Beneficiary batch staged");

    Ok(StagedBatch {
        cache_key,
        expires_at,
        count,
    })
}

/// Stored payload for `cache_key` while it has not expired
pub async fn fetch(pool: &SqlitePool, cache_key: &str, now: NaiveDateTime) -> Result<Value> {
    let entry = import_cache::find_active(pool, cache_key, now)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Lote {cache_key}")))?;
    serde_json::from_str(&entry.payload).map_err(|e| Error::Internal(e.to_string()))
}
