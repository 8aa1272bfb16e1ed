pub mod agents;
pub mod client;
pub mod parser;
pub mod prompt;

pub use agents::*;
pub use client::*;
pub use parser::*;
pub use prompt::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM endpoint unreachable at {0}")]
    Connection(String),

    #[error("LLM returned error (status {status}): {body}")]
    Endpoint { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Empty prompt input")]
    EmptyInput,
}
