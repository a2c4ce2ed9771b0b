//! Append-only CSV writer for experiment records.
//!
//! Every append is an independent open-write-close cycle. A new log file is
//! claimed with an exclusive create, so exactly one caller ever writes its
//! header row; every other caller falls back to a plain append.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use evalog_common::schema::field;
use evalog_common::{Error, FieldSchema, HeaderCheck, Result, RunIdGenerator};
use tracing::{debug, info, warn};

use crate::record::{normalize, NormalizedRecord, Record};

/// Writer configuration for a single log destination.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Destination CSV file.
    pub path: PathBuf,

    /// Synthesize a run ID when the record has none.
    pub auto_id: bool,

    /// Prefix for synthesized run IDs.
    pub run_id_prefix: String,

    /// Handling of an existing header that differs from the schema.
    pub header_check: HeaderCheck,
}

impl WriterConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            auto_id: true,
            run_id_prefix: evalog_common::DEFAULT_RUN_ID_PREFIX.to_string(),
            header_check: HeaderCheck::default(),
        }
    }

    pub fn with_auto_id(mut self, auto_id: bool) -> Self {
        self.auto_id = auto_id;
        self
    }

    pub fn with_run_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.run_id_prefix = prefix.into();
        self
    }

    pub fn with_header_check(mut self, check: HeaderCheck) -> Self {
        self.header_check = check;
        self
    }
}

/// Normalizes records against an injected schema and appends them to CSV.
#[derive(Debug)]
pub struct RecordWriter {
    schema: FieldSchema,
    ids: RunIdGenerator,
    header_check: HeaderCheck,
}

impl RecordWriter {
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            ids: RunIdGenerator::default(),
            header_check: HeaderCheck::default(),
        }
    }

    pub fn with_run_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ids = RunIdGenerator::new(prefix);
        self
    }

    pub fn with_header_check(mut self, check: HeaderCheck) -> Self {
        self.header_check = check;
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Expand a partial record to this writer's schema.
    pub fn normalize<'s>(&'s self, record: &Record) -> NormalizedRecord<'s> {
        normalize(&self.schema, record)
    }

    /// Fill a missing `run_id` (when `auto_id` is set) and `timestamp`.
    ///
    /// Values already present are left alone, so filling twice is harmless.
    pub fn fill_defaults(&self, record: &mut Record, auto_id: bool) {
        if auto_id && !record.has_value(field::RUN_ID) {
            record.insert(field::RUN_ID, String::from(self.ids.next_id()));
        }
        if !record.has_value(field::TIMESTAMP) {
            record.insert(field::TIMESTAMP, utc_timestamp());
        }
    }

    /// Append one record to `path`, returning the run ID that was written.
    ///
    /// Missing `run_id` (when `auto_id` is set) and `timestamp` are filled in
    /// first. The returned ID is empty only when `auto_id` is off and the
    /// caller supplied none.
    pub fn append(&self, mut record: Record, path: &Path, auto_id: bool) -> Result<String> {
        self.fill_defaults(&mut record, auto_id);

        let normalized = self.normalize(&record);
        let run_id = record
            .get(field::RUN_ID)
            .map(ToString::to_string)
            .unwrap_or_default();

        ensure_parent_dir(path)?;
        let row = encode_row(normalized.to_row())?;

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => {
                let bytes = self.header_and(&row)?;
                if let Err(err) = write_once(file, &bytes, path) {
                    discard_partial(path);
                    return Err(err);
                }
                info!(path = %path.display(), schema_version = self.schema.version(), "created experiment log");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let file = OpenOptions::new()
                    .append(true)
                    .open(path)
                    .map_err(|e| Error::io(path, e))?;
                let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
                if len == 0 {
                    // A zero-length log has no header yet.
                    let bytes = self.header_and(&row)?;
                    write_once(file, &bytes, path)?;
                    info!(path = %path.display(), "wrote header to empty experiment log");
                } else {
                    self.check_header(path)?;
                    write_once(file, &row, path)?;
                }
            }
            Err(e) => return Err(Error::io(path, e)),
        }

        debug!(path = %path.display(), run_id = %run_id, "appended experiment record");
        Ok(run_id)
    }

    fn header_and(&self, row: &[u8]) -> Result<Vec<u8>> {
        let mut bytes = encode_row(self.schema.fields())?;
        bytes.extend_from_slice(row);
        Ok(bytes)
    }

    fn check_header(&self, path: &Path) -> Result<()> {
        if self.header_check == HeaderCheck::Ignore {
            return Ok(());
        }

        let header = read_header(path)?;
        if self.schema.header_matches(header.as_slice()) {
            return Ok(());
        }

        let expected = self.schema.fields().join(",");
        let actual = header.join(",");
        match self.header_check {
            HeaderCheck::Reject => Err(Error::SchemaDrift {
                path: path.to_path_buf(),
                expected,
                actual,
            }),
            _ => {
                warn!(path = %path.display(), %expected, %actual, "log header does not match schema");
                Ok(())
            }
        }
    }
}

impl Default for RecordWriter {
    fn default() -> Self {
        Self::new(FieldSchema::v1())
    }
}

/// A [`RecordWriter`] bound to one destination.
#[derive(Debug)]
pub struct ExperimentLog {
    writer: RecordWriter,
    path: PathBuf,
    auto_id: bool,
}

impl ExperimentLog {
    pub fn new(config: WriterConfig) -> Self {
        Self::with_schema(config, FieldSchema::v1())
    }

    pub fn with_schema(config: WriterConfig, schema: FieldSchema) -> Self {
        let writer = RecordWriter::new(schema)
            .with_run_id_prefix(config.run_id_prefix)
            .with_header_check(config.header_check);
        Self {
            writer,
            path: config.path,
            auto_id: config.auto_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&self) -> &RecordWriter {
        &self.writer
    }

    /// Fill in the identifier and timestamp a logged record would receive.
    pub fn prepare(&self, mut record: Record) -> Record {
        self.writer.fill_defaults(&mut record, self.auto_id);
        record
    }

    /// Append a record, returning its run ID.
    pub fn log(&self, record: Record) -> Result<String> {
        self.writer.append(record, &self.path, self.auto_id)
    }
}

/// Current time in UTC, RFC 3339 with microseconds and a `+00:00` offset.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| Error::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

/// Encode one CSV row, newline-terminated, into memory.
fn encode_row<I, S>(cells: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(cells)?;
    wtr.into_inner()
        .map_err(|e| Error::Csv(csv::Error::from(e.into_error())))
}

// The whole buffer goes out in one call so a row is never split across writes.
fn write_once(mut file: File, bytes: &[u8], path: &Path) -> Result<()> {
    file.write_all(bytes).map_err(|e| Error::io(path, e))
}

/// Remove a log whose first write failed, so the next append starts it afresh.
fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove partially written log");
    }
}

fn read_header(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let mut header = csv::StringRecord::new();
    if rdr.read_record(&mut header)? {
        Ok(header.iter().map(String::from).collect())
    } else {
        Ok(Vec::new())
    }
}
