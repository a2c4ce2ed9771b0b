//! Evalog telemetry storage.
//!
//! This crate provides:
//! - The [`Record`] builder and [`FieldValue`] cell type
//! - Normalization of partial records against a [`FieldSchema`]
//! - The append-only CSV [`RecordWriter`] with write-once headers

pub mod record;
pub mod writer;

pub use evalog_common::{FieldSchema, DEFAULT_LOG_FILE};
pub use record::{normalize, FieldValue, NormalizedRecord, Record};
pub use writer::{ExperimentLog, RecordWriter, WriterConfig};
