//! Error types for choice formatting.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Malformed letter code: {0}")]
    MalformedLetterCode(String),

    #[error(transparent)]
    Compact(#[from] dom_compact::CompactError),
}
