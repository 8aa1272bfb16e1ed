use std::path::Path;

use serde_json::Value;

use super::OcrError;

/// Raw outcome of one OCR call.
///
/// `raw` is the response body exactly as received, preserved for the
/// `ocr_response_raw.json` artifact. `payload` is the parsed form used by
/// the normalizer; a body that is not JSON parses to an empty object and the
/// success flag decides whether the run can continue.
#[derive(Debug, Clone)]
pub struct OcrResponse {
    pub raw: String,
    pub payload: Value,
}

impl OcrResponse {
    pub fn from_raw(raw: String) -> Self {
        let payload = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Self { raw, payload }
    }

    /// True when the service marked the payload usable.
    /// Absence of a `success` flag counts as failure.
    pub fn is_success(&self) -> bool {
        self.payload
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Error message surfaced verbatim from a failed payload.
    pub fn error_message(&self) -> String {
        for key in ["message", "error"] {
            if let Some(msg) = self.payload.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
        "Unknown OCR error".to_string()
    }
}

/// Seam for the external OCR collaborator.
pub trait OcrClient {
    /// Send a document file for recognition and return the raw response.
    fn recognize(&self, file: &Path) -> Result<OcrResponse, OcrError>;
}

/// Blocking HTTP client for a multipart-upload OCR endpoint.
pub struct HttpOcrClient {
    url: String,
    engine: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpOcrClient {
    pub fn new(url: &str, engine: &str, timeout_secs: u64) -> Result<Self, OcrError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            engine: engine.to_string(),
            client,
            timeout_secs,
        })
    }
}

impl OcrClient for HttpOcrClient {
    fn recognize(&self, file: &Path) -> Result<OcrResponse, OcrError> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("pdf", file)?
            .text("ocr", self.engine.clone());

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    OcrError::Connection(self.url.clone())
                } else if e.is_timeout() {
                    OcrError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
                } else {
                    OcrError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| OcrError::HttpClient(e.to_string()))?;

        if !status.is_success() {
            return Err(OcrError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(file = %file.display(), bytes = body.len(), "OCR response received");
        Ok(OcrResponse::from_raw(body))
    }
}

/// In-memory OCR client returning a configured body, for pipeline tests.
pub struct MockOcrClient {
    raw: String,
}

impl MockOcrClient {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
        }
    }
}

impl OcrClient for MockOcrClient {
    fn recognize(&self, _file: &Path) -> Result<OcrResponse, OcrError> {
        Ok(OcrResponse::from_raw(self.raw.clone()))
    }
}
