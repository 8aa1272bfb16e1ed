use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Claimcheck";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum accepted PDF page count. Longer documents are rejected before
/// any model call is made.
pub const MAX_PDF_PAGES: usize = 3;

/// Minimum token-sort similarity (0-100) for two names to count as a match.
pub const FIO_MATCH_THRESHOLD: f64 = 90.0;

/// Document validity window in days, counted from the issuance date.
pub const VALIDITY_WINDOW_DAYS: i64 = 30;

/// Civil time zone offset (hours east of UTC) used for all date checks.
pub const BUSINESS_TZ_OFFSET_HOURS: i32 = 5;

// OCR artifacts
pub const OCR_RAW_FILENAME: &str = "ocr_response_raw.json";
pub const OCR_PAGES_FILENAME: &str = "ocr_pages.json";

// Model-output artifacts
pub const DOC_TYPE_RAW_FILENAME: &str = "doc_type_raw.json";
pub const DOC_TYPE_FILTERED_FILENAME: &str = "doc_type_filtered.json";
pub const EXTRACTOR_RAW_FILENAME: &str = "extractor_raw.json";
pub const EXTRACTOR_FILTERED_FILENAME: &str = "extractor_filtered.json";
pub const MERGED_FILENAME: &str = "merged.json";
pub const VALIDATION_FILENAME: &str = "validation.json";

// Run metadata artifacts
pub const METADATA_FILENAME: &str = "metadata.json";
pub const MANIFEST_FILENAME: &str = "manifest.json";
pub const FINAL_RESULT_FILENAME: &str = "final_result.json";

/// Default root directory for per-run artifact trees,
/// ~/Claimcheck/runs/ on all platforms.
pub fn default_runs_root() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME).join("runs")
}

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "info,claimcheck=debug"
}
