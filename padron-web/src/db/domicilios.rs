//! Address persistence (one per beneficiary)

use chrono::NaiveDateTime;
use padron_common::db::Domicilio;
use padron_common::time::to_db;
use padron_common::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Address values to write; `None` keeps whatever is stored
#[derive(Debug, Clone, Default)]
pub struct DomicilioCambios {
    pub calle: Option<String>,
    pub numero_ext: Option<String>,
    pub numero_int: Option<String>,
    pub colonia: Option<String>,
    pub codigo_postal: Option<String>,
}

pub async fn find_by_beneficiario(
    conn: &mut SqliteConnection,
    beneficiario_id: &str,
) -> Result<Option<Domicilio>> {
    let domicilio = sqlx::query_as::<_, Domicilio>(
        r#"
        SELECT id, beneficiario_id, calle, numero_ext, numero_int, colonia, codigo_postal,
               municipio_id, seccion_id
        FROM domicilios WHERE beneficiario_id = ?
        "#,
    )
    .bind(beneficiario_id)
    .fetch_optional(conn)
    .await?;
    Ok(domicilio)
}

/// Create or update the beneficiary's address.
///
/// Municipality and section always come from the resolved section and are
/// overwritten; text fields are only overwritten when supplied.
pub async fn upsert(
    conn: &mut SqliteConnection,
    beneficiario_id: &str,
    cambios: &DomicilioCambios,
    municipio_id: i64,
    seccion_id: i64,
    now: NaiveDateTime,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO domicilios (
            id, beneficiario_id, calle, numero_ext, numero_int, colonia, codigo_postal,
            municipio_id, seccion_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(beneficiario_id) DO UPDATE SET
            calle = COALESCE(excluded.calle, domicilios.calle),
            numero_ext = COALESCE(excluded.numero_ext, domicilios.numero_ext),
            numero_int = COALESCE(excluded.numero_int, domicilios.numero_int),
            colonia = COALESCE(excluded.colonia, domicilios.colonia),
            codigo_postal = COALESCE(excluded.codigo_postal, domicilios.codigo_postal),
            municipio_id = excluded.municipio_id,
            seccion_id = excluded.seccion_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(beneficiario_id)
    .bind(&cambios.calle)
    .bind(&cambios.numero_ext)
    .bind(&cambios.numero_int)
    .bind(&cambios.colonia)
    .bind(&cambios.codigo_postal)
    .bind(municipio_id)
    .bind(seccion_id)
    .bind(to_db(now))
    .bind(to_db(now))
    .execute(conn)
    .await?;
    Ok(())
}
