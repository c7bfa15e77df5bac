//! Typed failures surfaced by the page and file stores.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WikiError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid identity {name:?}: {reason}")]
    InvalidIdentity { name: String, reason: &'static str },

    #[error("{name} is not valid UTF-8")]
    Encoding { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WikiError {
    /// True for the recoverable "nothing stored under that name" cases.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::PageNotFound(_) | WikiError::FileNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;
