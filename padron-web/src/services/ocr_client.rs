//! OCR service client
//!
//! Forwards the front and back photos of a voter ID card to the external
//! recognition service and relays its field/confidence payload unchanged.
//! The proxy never retries; a failed call is reported to the caller, who may
//! try again later.

use padron_common::config::OcrConfig;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

const EXTRACT_PATH: &str = "/v1/ine/extract";
const API_KEY_HEADER: &str = "X-Api-Key";

/// OCR proxy errors, each mapped to its own response status and error code
#[derive(Debug, Error)]
pub enum OcrError {
    /// Could not reach the service (connection refused, DNS, timeout)
    #[error("OCR service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status
    #[error("OCR service returned {status}: {message}")]
    Upstream {
        status: u16,
        error_code: String,
        message: String,
        details: Value,
    },

    /// Local fault preparing the request or reading the response
    #[error("OCR internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// HTTP status returned to our caller
    pub fn http_status(&self) -> u16 {
        match self {
            OcrError::Unavailable(_) => 502,
            OcrError::Upstream { status, .. } => match *status {
                429 => 429,
                s if s >= 500 => 502,
                s => s,
            },
            OcrError::Internal(_) => 500,
        }
    }

    /// Response body returned to our caller
    pub fn body(&self) -> Value {
        match self {
            OcrError::Unavailable(_) => json!({
                "error_code": "OCR_SERVICE_UNAVAILABLE",
                "message": "El servicio OCR no está disponible en este momento. Intenta de nuevo más tarde.",
            }),
            OcrError::Upstream {
                error_code,
                message,
                details,
                ..
            } => json!({
                "error_code": error_code,
                "message": message,
                "details": details,
            }),
            OcrError::Internal(_) => json!({
                "error_code": "OCR_INTERNAL_ERROR",
                "message": "Error interno al procesar la solicitud OCR.",
            }),
        }
    }

    /// Build from a failed upstream response body (JSON or not)
    fn from_upstream(status: u16, body: &[u8]) -> Self {
        let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let text = |key: &str| parsed.get(key).and_then(Value::as_str).map(str::to_string);

        OcrError::Upstream {
            status,
            error_code: text("error_code").unwrap_or_else(|| "OCR_SERVICE_ERROR".to_string()),
            message: text("message").unwrap_or_else(|| "Error en el servicio OCR.".to_string()),
            details: parsed.get("details").cloned().unwrap_or(Value::Null),
        }
    }
}

/// One uploaded photo, already checked to be JPEG or PNG
#[derive(Debug, Clone)]
pub struct OcrImage {
    pub bytes: Vec<u8>,
    /// File extension without the dot ("jpg" or "png")
    pub extension: &'static str,
    pub mime: &'static str,
}

impl OcrImage {
    fn into_part(self, stem: &str) -> Result<Part, OcrError> {
        Part::bytes(self.bytes)
            .file_name(format!("{stem}.{}", self.extension))
            .mime_str(self.mime)
            .map_err(|e| OcrError::Internal(e.to_string()))
    }
}

/// Client for the OCR extraction endpoint
#[derive(Debug, Clone)]
pub struct OcrClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OcrError::Internal(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", config.url.trim_end_matches('/'), EXTRACT_PATH),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send both photos and return the service's JSON payload verbatim
    pub async fn extract(&self, front: OcrImage, back: OcrImage) -> Result<Value, OcrError> {
        let form = Form::new()
            .part("front_image", front.into_part("front")?)
            .part("back_image", back.into_part("back")?);

        let mut request = self.http_client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        debug!(url = %self.endpoint, "Forwarding ID photos to OCR service");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                error!(url = %self.endpoint, error = %e, "OCR request could not be built");
                return Err(OcrError::Internal(e.to_string()));
            }
            Err(e) => {
                warn!(url = %self.endpoint, error = %e, "OCR service unreachable");
                return Err(OcrError::Unavailable(e.to_string()));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %self.endpoint, error = %e, "OCR response interrupted");
                return Err(OcrError::Unavailable(e.to_string()));
            }
        };

        if !status.is_success() {
            let err = OcrError::from_upstream(status.as_u16(), &body);
            warn!(
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "OCR service error"
            );
            return Err(err);
        }

        serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "OCR service returned an unreadable payload");
            OcrError::Internal(e.to_string())
        })
    }
}
