//! Run identity types.
//!
//! A run is named by a [`RunId`]. Callers may bring their own identifier; when
//! they don't, a [`RunIdGenerator`] synthesizes one from the wall clock.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Default prefix for synthesized run IDs.
pub const DEFAULT_RUN_ID_PREFIX: &str = "run";

/// Number of hex characters kept from a prompt digest.
pub const PROMPT_HASH_LEN: usize = 12;

/// Run ID naming one evaluation run.
///
/// Format when synthesized: `<prefix>-<unix_millis>`
/// Example: `run-1760702400123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Build a run ID from a prefix and a millisecond timestamp.
    pub fn from_millis(prefix: &str, millis: i64) -> Self {
        RunId(format!("{}-{}", prefix, millis))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

/// Synthesizes run IDs from the wall clock.
///
/// Issued milliseconds are strictly increasing per generator: if the clock
/// has not moved past the last issued value, the next ID uses `last + 1`.
#[derive(Debug)]
pub struct RunIdGenerator {
    prefix: String,
    last_millis: AtomicI64,
}

impl RunIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_millis: AtomicI64::new(i64::MIN),
        }
    }

    /// Issue the next run ID using the current time.
    pub fn next_id(&self) -> RunId {
        self.next_at(chrono::Utc::now().timestamp_millis())
    }

    /// Issue the next run ID as if the clock read `now_millis`.
    pub fn next_at(&self, now_millis: i64) -> RunId {
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let candidate = if now_millis > last { now_millis } else { last + 1 };
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return RunId::from_millis(&self.prefix, candidate),
                Err(current) => last = current,
            }
        }
    }
}

impl Default for RunIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_ID_PREFIX)
    }
}

/// Short, stable digest of a prompt for the `prompt_hash` field.
pub fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(PROMPT_HASH_LEN);
    digest
}
