//! Core errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The interactive date prompt could not produce a date.
    #[error("Date prompt failed: {0}")]
    PromptFailed(String),
}
