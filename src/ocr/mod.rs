pub mod client;
pub mod document;
pub mod normalize;

pub use client::*;
pub use document::*;
pub use normalize::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR endpoint unreachable at {0}")]
    Connection(String),

    #[error("OCR service returned error (status {status}): {body}")]
    Endpoint { status: u16, body: String },

    #[error("OCR service reported failure: {0}")]
    ServiceFailure(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unsupported OCR payload structure: expected data.text, data.pages, or a Blocks detection list")]
    UnsupportedFormat,

    #[error("Document conversion failed: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
