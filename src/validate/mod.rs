pub mod dates;
pub mod engine;
pub mod text_norm;

pub use dates::*;
pub use engine::*;
pub use text_norm::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
