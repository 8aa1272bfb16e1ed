use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validate::Checks;

/// Run-level error codes. Append-only: external tooling matches on these
/// strings, so existing variants never change or disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FileSaveFailed,
    PdfTooManyPages,
    OcrFailed,
    OcrFilterFailed,
    OcrEmptyPages,
    DtcFailed,
    DtcParseError,
    MultipleDocuments,
    ExtractFailed,
    ExtractSchemaInvalid,
    MergeFailed,
    ValidationFailed,
    FioMismatch,
    DocTypeMismatch,
    DocDateTooOld,
    DocDateParseFailed,
    SingleDocTypeInvalid,
}

/// One typed run error with optional free-text detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl RunError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, details: impl std::fmt::Display) -> Self {
        Self {
            code,
            details: Some(details.to_string()),
        }
    }
}

/// One document-processing request: claim metadata plus the source file.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub fio: Option<String>,
    pub reason: Option<String>,
    pub doc_type: String,
    pub source_path: PathBuf,
    pub original_filename: String,
    pub content_type: Option<String>,
}

/// Typed view of the filtered extractor output. Construction validates the
/// schema: all three keys present, each null or a string — anything else is
/// rejected at this boundary instead of flowing downstream as a loose dict.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFields {
    pub fio: Option<String>,
    pub doc_type: Option<String>,
    pub doc_date: Option<String>,
}

impl ExtractedFields {
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, String> {
        let field = |key: &str| -> Result<Option<String>, String> {
            match map.get(key) {
                None => Err(format!("Missing key: {key}")),
                Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(format!(
                    "Key {key} has invalid type: expected string or null, got {other}"
                )),
            }
        };
        Ok(Self {
            fio: field("fio")?,
            doc_type: field("doc_type")?,
            doc_date: field("doc_date")?,
        })
    }
}

/// Terminal status recorded in the manifest. A run whose stage machine
/// completed is a success even when the verdict is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Submission metadata echoed into the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInput {
    pub fio: Option<String>,
    pub reason: Option<String>,
    pub doc_type: String,
}

/// Saved-file bookkeeping in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub original_filename: String,
    pub saved_path: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
}

/// The per-run audit manifest (`manifest.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: String,
    pub created_at: DateTime<FixedOffset>,
    pub user_input: UserInput,
    pub file: FileInfo,
    /// Artifact path map, as far as the run got.
    pub processing: BTreeMap<String, String>,
    pub status: RunStatus,
    pub error: Option<ErrorCode>,
    pub final_result_path: String,
}

/// The single authoritative output of a run (`final_result.json`).
/// Always written, on failure paths included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub run_id: String,
    pub verdict: bool,
    pub errors: Vec<RunError>,
    pub checks: Option<Checks>,
    pub artifacts: BTreeMap<String, String>,
}
