//! Program slug derivation

use padron_common::Result;
use sqlx::SqliteConnection;

use crate::db::programas;

const FALLBACK_SLUG: &str = "programa";

/// Lowercase ASCII slug: Spanish accents transliterated, every run of other
/// characters collapsed to a single `-`, no leading or trailing `-`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        let mapped = match c {
            'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
            'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
            'ñ' | 'Ñ' => 'n',
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => {
                pending_dash = true;
                continue;
            }
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(mapped);
    }

    slug
}

/// First free slug among `base`, `base-1`, `base-2`, ... where `base` is the
/// slugified explicit slug or, failing that, the name. `exclude_id` is the
/// program being updated, whose own slug does not count as taken.
pub async fn unique_slug(
    conn: &mut SqliteConnection,
    explicit: Option<&str>,
    nombre: &str,
    exclude_id: Option<i64>,
) -> Result<String> {
    let source = explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(nombre);
    let mut base = slugify(source);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut candidate = base.clone();
    let mut suffix = 1;
    while programas::slug_taken(conn, &candidate, exclude_id).await? {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}
