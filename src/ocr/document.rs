use std::path::{Path, PathBuf};

use super::OcrError;

/// Seam for the image-to-PDF collaborator. Implementations return a
/// temporary PDF path; the pipeline owns deleting that file once the OCR
/// call has completed or failed.
pub trait DocumentConverter {
    fn to_pdf(&self, image_path: &Path) -> Result<PathBuf, OcrError>;
}

/// File extensions treated as already-PDF input.
pub fn is_pdf(path: &Path) -> bool {
    matches!(extension_lower(path).as_deref(), Some("pdf"))
}

/// File extensions treated as scanned-image input eligible for conversion.
pub fn is_image(path: &Path) -> bool {
    matches!(
        extension_lower(path).as_deref(),
        Some("jpg" | "jpeg" | "png" | "tif" | "tiff" | "bmp" | "webp")
    )
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Best-effort PDF page count.
///
/// Tries a structural parse first, then falls back to scanning the raw bytes
/// for page-object markers. Returns None when the file cannot be read or no
/// count can be established — an unknown count must not fail a run, only a
/// confirmed over-limit count does.
pub fn count_pdf_pages(path: &Path) -> Option<usize> {
    match lopdf::Document::load(path) {
        Ok(doc) => {
            let count = doc.get_pages().len();
            if count > 0 {
                return Some(count);
            }
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Structural PDF parse failed, scanning bytes");
        }
    }

    let data = std::fs::read(path).ok()?;
    count_page_markers(&data)
}

/// Count `/Type /Page` object markers in raw PDF bytes.
/// The word boundary keeps `/Pages` tree nodes out of the count.
fn count_page_markers(data: &[u8]) -> Option<usize> {
    let re = regex::bytes::Regex::new(r"/Type\s*/Page\b").ok()?;
    let count = re.find_iter(data).count();
    if count > 0 {
        Some(count)
    } else {
        None
    }
}
