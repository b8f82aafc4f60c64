//! Error types for optscope-storage

use std::fmt;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Filesystem errors (create, append, flush, read)
    IO,
    /// Existing table has a header that is not ours
    HeaderMismatch,
    /// Row text that cannot be parsed back into fields
    MalformedRow,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::IO => "io",
            ErrorKind::HeaderMismatch => "header_mismatch",
            ErrorKind::MalformedRow => "malformed_row",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IO, message)
    }

    pub fn header_mismatch(found: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::HeaderMismatch,
            format!("Unexpected result table header: {}", found.into()),
        )
    }

    pub fn malformed_row(line: usize, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MalformedRow,
            format!("Line {}: {}", line, message.into()),
        )
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::io(format!("IO error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;
