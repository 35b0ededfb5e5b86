//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading tiles or writing feature tables
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Empty file: {path}")]
    EmptyFile { path: String },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: String, column: String },

    #[error("Parse error in {path} line {line}: {message}")]
    ParseError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for pointfeat_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(e) => pointfeat_core::Error::Io(e),
            other => pointfeat_core::Error::InvalidData(other.to_string()),
        }
    }
}
