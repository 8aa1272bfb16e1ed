use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::config;

use super::ArtifactError;

/// Generates a run identifier of the form `YYYYMMDD_HHMMSS_xxxxx`.
/// The timestamp keeps sibling directories sortable; the uuid fragment
/// disambiguates runs started within the same second.
pub fn new_run_id() -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(5).collect();
    format!("{stamp}_{suffix}")
}

/// Reduces an uploaded filename to a filesystem-safe form. Anything outside
/// word characters, dash, dot and whitespace becomes an underscore, then
/// whitespace runs collapse to a single underscore.
pub fn safe_filename(name: &str) -> String {
    let disallowed = regex::Regex::new(r"[^\w\-\.\s]").unwrap();
    let spaces = regex::Regex::new(r"\s+").unwrap();
    let cleaned = disallowed.replace_all(name, "_");
    let cleaned = spaces.replace_all(&cleaned, "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Per-run directory tree:
///
/// ```text
/// <runs_root>/<YYYY-MM-DD>/<run_id>/
///   input/original/   the uploaded file, saved verbatim
///   ocr/              OCR response and normalized pages
///   model/            agent outputs, merged record, validation record
///   meta/             metadata, manifest, final result
/// ```
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub input_dir: PathBuf,
    pub ocr_dir: PathBuf,
    pub model_dir: PathBuf,
    pub meta_dir: PathBuf,
}

impl RunLayout {
    pub fn create(runs_root: &Path, run_id: &str) -> std::io::Result<Self> {
        let day = Local::now().format("%Y-%m-%d").to_string();
        let run_dir = runs_root.join(day).join(run_id);
        let input_dir = run_dir.join("input").join("original");
        let ocr_dir = run_dir.join("ocr");
        let model_dir = run_dir.join("model");
        let meta_dir = run_dir.join("meta");
        for dir in [&input_dir, &ocr_dir, &model_dir, &meta_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            run_id: run_id.to_string(),
            run_dir,
            input_dir,
            ocr_dir,
            model_dir,
            meta_dir,
        })
    }

    pub fn saved_input_path(&self, original_filename: &str) -> PathBuf {
        self.input_dir.join(safe_filename(original_filename))
    }

    pub fn ocr_raw_path(&self) -> PathBuf {
        self.ocr_dir.join(config::OCR_RAW_FILENAME)
    }

    pub fn ocr_pages_path(&self) -> PathBuf {
        self.ocr_dir.join(config::OCR_PAGES_FILENAME)
    }

    pub fn doc_type_raw_path(&self) -> PathBuf {
        self.model_dir.join(config::DOC_TYPE_RAW_FILENAME)
    }

    pub fn doc_type_filtered_path(&self) -> PathBuf {
        self.model_dir.join(config::DOC_TYPE_FILTERED_FILENAME)
    }

    pub fn extractor_raw_path(&self) -> PathBuf {
        self.model_dir.join(config::EXTRACTOR_RAW_FILENAME)
    }

    pub fn extractor_filtered_path(&self) -> PathBuf {
        self.model_dir.join(config::EXTRACTOR_FILTERED_FILENAME)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.model_dir.join(config::MERGED_FILENAME)
    }

    pub fn validation_path(&self) -> PathBuf {
        self.model_dir.join(config::VALIDATION_FILENAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.meta_dir.join(config::METADATA_FILENAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.meta_dir.join(config::MANIFEST_FILENAME)
    }

    pub fn final_result_path(&self) -> PathBuf {
        self.meta_dir.join(config::FINAL_RESULT_FILENAME)
    }
}

/// Writes a value as pretty-printed JSON, creating parent directories
/// as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    Ok(())
}
