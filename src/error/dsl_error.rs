//! Document loading errors.

use thiserror::Error;

/// Failures of the document loader. Each one becomes the single terminal
/// `parse_error` issue of a validation result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DslError {
    #[error("document is empty")]
    Empty,
    #[error("document is not valid UTF-8: {0}")]
    InvalidEncoding(String),
    #[error("invalid {format} syntax: {message}")]
    Syntax {
        format: &'static str,
        message: String,
    },
    #[error("document root must be a mapping, found {0}")]
    InvalidRoot(String),
}
