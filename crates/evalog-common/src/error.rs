//! Error types for Evalog.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Evalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Evalog.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("field already present in schema: {0}")]
    DuplicateField(String),

    // Schema errors (20-29)
    #[error("header of {path} does not match schema: expected [{expected}], found [{actual}]")]
    SchemaDrift {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // I/O errors (60-69)
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::CreateDir { .. } => 11,
            Error::InvalidSchema(_) => 12,
            Error::DuplicateField(_) => 13,
            Error::SchemaDrift { .. } => 20,
            Error::Io { .. } => 60,
            Error::Csv(_) => 61,
            Error::Json(_) => 62,
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs to the configuration range.
    pub fn is_config(&self) -> bool {
        (10..20).contains(&self.code())
    }
}
