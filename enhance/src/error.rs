//! Error type shared by the page, storage and analytics seams.
//!
//! Nothing in this crate lets a `PageError` escape to the user: components
//! log the failure and carry on without the intended effect.

use thiserror::Error;

/// Failure reported by a platform operation.
#[derive(Debug, Error)]
pub enum PageError {
    /// A referenced element does not exist in the document
    #[error("element not found: {0}")]
    MissingElement(String),
    /// The preference store rejected a read or write
    #[error("preference store unavailable: {0}")]
    Storage(String),
    /// The host platform threw while running an operation
    #[error("script error: {0}")]
    Script(String),
    /// Configuration text could not be parsed
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for platform operations.
pub type Result<T> = std::result::Result<T, PageError>;
