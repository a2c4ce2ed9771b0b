//! Exit codes for the evalog CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.

use evalog_common::Error;

/// Exit codes for evalog operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Clean = 0,

    /// Invalid arguments or configuration
    ConfigError = 10,

    /// I/O or encoding error
    IoError = 13,

    /// Existing log header disagrees with the schema
    SchemaDrift = 14,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a library error onto its exit code.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::SchemaDrift { .. } => ExitCode::SchemaDrift,
            Error::Io { .. } | Error::Csv(_) | Error::Json(_) => ExitCode::IoError,
            e if e.is_config() => ExitCode::ConfigError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
