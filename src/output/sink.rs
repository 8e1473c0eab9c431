//! Record sinks
//!
//! A sink is the durable, append-only destination for page records. Worker
//! tasks call [`Sink::append`] concurrently, so every implementation must keep
//! each record intact when appends interleave.

use crate::output::PageRecord;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors that can occur while appending a record
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for record sink implementations
pub trait Sink: Send + Sync {
    /// Appends one record
    ///
    /// Must not corrupt previously written records when called from several
    /// tasks at once.
    fn append(&self, record: &PageRecord) -> Result<(), SinkError>;
}

/// Appends records to a file in their JSON exchange form
///
/// Records are written back-to-back. The file is opened in append mode and
/// never truncated, so an existing log keeps its earlier records.
pub struct JsonLogSink {
    file: Mutex<File>,
}

impl JsonLogSink {
    /// Opens (creating if needed) the log at `path` for appending
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let mut options = OpenOptions::new();
        options.append(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(path)?;
        tracing::debug!("Opened record log {}", path.display());

        Ok(Self { file: Mutex::new(file) })
    }

    fn file(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for JsonLogSink {
    fn append(&self, record: &PageRecord) -> Result<(), SinkError> {
        // Serialize outside the lock; only the write itself is serialized
        let encoded = record.to_json()?;

        let mut file = self.file();
        file.write_all(encoded.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps records in memory
///
/// Useful for embedding the crawler as a library and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<PageRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record appended so far, in append order
    pub fn records(&self) -> Vec<PageRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sink for MemorySink {
    fn append(&self, record: &PageRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
