pub mod layout;
pub mod merge;
pub mod orchestrator;
pub mod types;

pub use layout::*;
pub use merge::*;
pub use orchestrator::*;
pub use types::*;

use thiserror::Error;

/// Failures while reading or writing run artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model output is not a JSON object: {0}")]
    NotAnObject(String),
}
