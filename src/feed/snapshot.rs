//! Snapshots
//!
//! A snapshot is the complete list of records handed over by the persistence
//! side for one ranking pass. Rows are decoded one by one so a single bad row
//! never takes the feed down with it.

use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use super::record::ContentRecord;
use crate::error::{Error, Result};

/// Immutable set of records for one ranking pass
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<ContentRecord>,
    /// Rows that could not be decoded and were dropped
    pub skipped: usize,
}

impl Snapshot {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records,
            skipped: 0,
        }
    }

    /// Accepts a bare array or a `{ "data": [...], "error": ... }` envelope
    pub fn from_value(value: Value) -> Result<Self> {
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(mut envelope) => {
                match envelope.remove("error") {
                    None | Some(Value::Null) => {}
                    Some(err) => {
                        return Err(Error::Upstream {
                            message: upstream_message(&err).into(),
                        })
                    }
                }
                match envelope.remove("data") {
                    Some(Value::Array(rows)) => rows,
                    Some(Value::Null) | None => Vec::new(),
                    Some(_) => {
                        return Err(Error::InvalidFormat {
                            message: "snapshot `data` must be an array".into(),
                        })
                    }
                }
            }
            _ => {
                return Err(Error::InvalidFormat {
                    message: "snapshot must be an array or an object with `data`".into(),
                })
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = 0;
        for (index, row) in rows.into_iter().enumerate() {
            match serde_json::from_value::<ContentRecord>(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping snapshot row {}: {}", index, e);
                }
            }
        }

        debug!("Decoded snapshot: {} records, {} skipped", records.len(), skipped);
        Ok(Self { records, skipped })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::Snapshot {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn upstream_message(err: &Value) -> String {
    err.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

/// Holder for the current snapshot. Readers always see a complete one.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<Vec<ContentRecord>>>>,
}

impl SnapshotStore {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(records))),
        }
    }

    /// The snapshot as of now; later replacements do not affect it
    pub fn load(&self) -> Arc<Vec<ContentRecord>> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn replace(&self, records: Vec<ContentRecord>) {
        let next = Arc::new(records);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Copy-on-write update of one record; returns the new version
    pub fn update<F>(&self, id: &str, f: F) -> Option<ContentRecord>
    where
        F: FnOnce(&ContentRecord) -> ContentRecord,
    {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let index = guard.iter().position(|r| r.id == id)?;
        let updated = f(&guard[index]);

        let mut next = (**guard).clone();
        next[index] = updated.clone();
        *guard = Arc::new(next);
        Some(updated)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }
}
