//! Extraction error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The endpoint could not be reached at all. Raised by the startup
    /// probe; fatal for the run.
    #[error("Extraction service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The model replied, but not with a usable payload.
    #[error("Response violates the expected schema: {0}")]
    SchemaViolation(String),

    #[error("OCR command '{command}' failed: {message}")]
    Ocr { command: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Transient errors are worth retrying; schema violations and IO
    /// failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractError::Network(_) => true,
            ExtractError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
