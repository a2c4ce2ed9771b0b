//! Field schema and schema versioning.
//!
//! The [`FieldSchema`] is the single source of truth for experiment-log
//! column order. Its order is an on-disk contract: fields may be appended at
//! the end, never inserted, removed or reordered.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current schema version for the experiment log.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (field removals, reordering)
/// - MINOR: Additive changes (fields appended at the end)
/// - PATCH: Bug fixes, documentation
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Canonical field names.
pub mod field {
    pub const RUN_ID: &str = "run_id";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TASK: &str = "task";
    pub const MODEL: &str = "model";
    pub const PROMPT_HASH: &str = "prompt_hash";
    pub const TEMPERATURE: &str = "temperature";
    pub const INPUT_TOKENS: &str = "input_tokens";
    pub const OUTPUT_TOKENS: &str = "output_tokens";
    pub const LATENCY_MS: &str = "latency_ms";
    pub const SCORE_RELEVANCE: &str = "score_relevance";
    pub const SCORE_FACTUALITY: &str = "score_factuality";
    pub const NOTES: &str = "notes";
    pub const ERROR_TYPE: &str = "error_type";
    pub const ERROR_MESSAGE: &str = "error_message";
}

/// Column order of schema version 1.
pub const FIELD_ORDER: [&str; 14] = [
    field::RUN_ID,
    field::TIMESTAMP,
    field::TASK,
    field::MODEL,
    field::PROMPT_HASH,
    field::TEMPERATURE,
    field::INPUT_TOKENS,
    field::OUTPUT_TOKENS,
    field::LATENCY_MS,
    field::SCORE_RELEVANCE,
    field::SCORE_FACTUALITY,
    field::NOTES,
    field::ERROR_TYPE,
    field::ERROR_MESSAGE,
];

/// Check if a schema version is compatible with current.
pub fn is_compatible(version: &str) -> bool {
    major_of(SCHEMA_VERSION) == major_of(version)
}

fn major_of(version: &str) -> u32 {
    version
        .split('.')
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0)
}

/// What to do when an existing log's header differs from the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HeaderCheck {
    /// Append without reading the existing header.
    #[default]
    Ignore,
    /// Log a warning on mismatch, then append.
    Warn,
    /// Refuse to append on mismatch.
    Reject,
}

impl std::fmt::Display for HeaderCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderCheck::Ignore => write!(f, "ignore"),
            HeaderCheck::Warn => write!(f, "warn"),
            HeaderCheck::Reject => write!(f, "reject"),
        }
    }
}

/// Immutable, versioned, ordered list of recognized record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    version: String,
    fields: Vec<String>,
}

impl FieldSchema {
    /// The built-in experiment schema.
    pub fn v1() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            fields: FIELD_ORDER.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Ordered field names; this order is the on-disk column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Column index of a field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Return a new schema with `name` appended and the minor version bumped.
    pub fn extend(&self, name: impl Into<String>) -> Result<Self> {
        let mut next = self.clone();
        next.push(name.into())?;
        next.version = bump_minor(&self.version);
        Ok(next)
    }

    /// Whether an on-disk header row matches this schema exactly.
    pub fn header_matches<S: AsRef<str>>(&self, header: &[S]) -> bool {
        header.len() == self.fields.len()
            && header
                .iter()
                .zip(&self.fields)
                .all(|(h, f)| h.as_ref() == f)
    }

    fn push(&mut self, name: String) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSchema("empty field name".to_string()));
        }
        if self.contains(&name) {
            return Err(Error::DuplicateField(name));
        }
        self.fields.push(name);
        Ok(())
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::v1()
    }
}

fn bump_minor(version: &str) -> String {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    format!("{}.{}.0", major, minor + 1)
}
