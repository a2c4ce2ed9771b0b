//! Evalog common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the evalog crates:
//! - Run identity and prompt hashing
//! - The versioned field schema
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use id::{prompt_hash, RunId, RunIdGenerator, DEFAULT_RUN_ID_PREFIX};
pub use output::OutputFormat;
pub use schema::{field, FieldSchema, HeaderCheck, FIELD_ORDER, SCHEMA_VERSION};

/// File name of the default experiment log.
pub const DEFAULT_LOG_FILE: &str = "experiment_log.csv";
