//! JSON array error log
//!
//! The whole log is one JSON array document. Every append reads the array,
//! pushes the new entry and rewrites the file. This keeps the file a single
//! machine-parseable document but is only safe with one writer process.

use crate::logstore::traits::{ensure_parent_dir, to_pretty_json, write_atomically};
use crate::logstore::{ErrorEntry, ErrorSink, StoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Error log stored as a single JSON array
#[derive(Debug, Clone)]
pub struct JsonArrayStore {
    path: PathBuf,
}

impl JsonArrayStore {
    /// Creates a store handle without touching the filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store handle and bootstraps the file
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(path);
        store.ensure_ready()?;
        Ok(store)
    }
}

impl ErrorSink for JsonArrayStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_ready(&self) -> StoreResult<()> {
        ensure_parent_dir(&self.path)?;
        if !self.path.exists() {
            write_atomically(&self.path, b"[]")?;
            tracing::debug!("Created error log {}", self.path.display());
        }
        Ok(())
    }

    fn append(&mut self, entry: &ErrorEntry) -> StoreResult<()> {
        self.ensure_ready()?;

        let mut entries = self.read_all()?;
        entries.push(entry.clone());

        write_atomically(&self.path, &to_pretty_json(&entries)?)?;
        Ok(())
    }

    fn read_all(&self) -> StoreResult<Vec<ErrorEntry>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        // Invalid UTF-8 is a decode failure like any other
        match serde_json::from_slice::<Vec<ErrorEntry>>(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    "Error log {} is unreadable, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }
}
