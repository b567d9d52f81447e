//! Voter ID OCR proxy endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};
use padron_common::FieldErrors;
use serde_json::Value;
use tracing::warn;

use crate::api::auth::{Actor, ANY_ROLE};
use crate::error::{ApiError, ApiResult};
use crate::services::ocr_client::OcrImage;
use crate::AppState;

/// Per-image upload cap (5120 KB)
pub const MAX_IMAGE_BYTES: usize = 5120 * 1024;
/// Request body cap for the extract route; two images plus multipart framing
pub const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

const FIELDS: [&str; 2] = ["front_image", "back_image"];

/// Check one upload: present, JPEG or PNG by content, within the size cap
fn check_image(
    field: &str,
    bytes: Option<Vec<u8>>,
    errors: &mut FieldErrors,
) -> Option<OcrImage> {
    let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
        errors.add(field, format!("El campo {field} es obligatorio."));
        return None;
    };

    let (extension, mime) = match infer::get(&bytes).map(|kind| kind.mime_type()) {
        Some("image/jpeg") => ("jpg", "image/jpeg"),
        Some("image/png") => ("png", "image/png"),
        _ => {
            errors.add(field, format!("El campo {field} debe ser una imagen JPEG o PNG."));
            return None;
        }
    };

    if bytes.len() > MAX_IMAGE_BYTES {
        errors.add(field, format!("El campo {field} no debe pesar mas de 5120 KB."));
        return None;
    }

    Some(OcrImage {
        bytes,
        extension,
        mime,
    })
}

/// Collect the two image fields; other fields are ignored
async fn read_images(multipart: &mut Multipart) -> ApiResult<[Option<Vec<u8>>; 2]> {
    let mut images: [Option<Vec<u8>>; 2] = [None, None];
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed OCR upload");
                let errors =
                    FieldErrors::single(FIELDS[0], "No se pudo leer la carga de imagenes.");
                return Err(errors.into());
            }
        };
        let Some(slot) = field
            .name()
            .and_then(|name| FIELDS.iter().position(|f| *f == name))
        else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| {
            warn!(error = %e, "OCR upload interrupted");
            ApiError::from(FieldErrors::single(FIELDS[slot], "No se pudo leer la imagen."))
        })?;
        images[slot] = Some(bytes.to_vec());
    }
    Ok(images)
}

/// POST /api/ocr/ine/extract
///
/// Forwards `front_image` and `back_image` to the OCR service and returns its
/// payload verbatim.
pub async fn extract(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    actor.require(ANY_ROLE)?;

    let [front, back] = match multipart {
        Ok(mut multipart) => read_images(&mut multipart).await?,
        Err(_) => [None, None],
    };

    let mut errors = FieldErrors::new();
    let front = check_image(FIELDS[0], front, &mut errors);
    let back = check_image(FIELDS[1], back, &mut errors);
    let (Some(front), Some(back)) = (front, back) else {
        return Err(ApiError::Validation(errors));
    };

    let payload = state.ocr.extract(front, back).await?;
    Ok(Json(payload))
}
