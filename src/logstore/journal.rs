//! Append-only journal error log
//!
//! One JSON record per line, written with a single `write_all` on a file
//! opened in append mode. The file is never rewritten, so concurrent writers
//! cannot erase each other's entries. A JSON array view is produced on demand
//! with `export_json_array`.

use crate::logstore::traits::ensure_parent_dir;
use crate::logstore::{ErrorEntry, ErrorSink, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Error log stored as newline-delimited JSON records
#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    /// Creates a journal handle without touching the filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a journal handle and bootstraps the file
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let journal = Self::new(path);
        journal.ensure_ready()?;
        Ok(journal)
    }

    /// Returns the size of the journal in bytes, zero if it does not exist
    pub fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// Returns true if the file is non-empty and its last byte is not a newline
fn has_torn_tail(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl ErrorSink for JournalStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_ready(&self) -> StoreResult<()> {
        ensure_parent_dir(&self.path)?;
        if !self.path.exists() {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            tracing::debug!("Created error journal {}", self.path.display());
        }
        Ok(())
    }

    fn append(&mut self, entry: &ErrorEntry) -> StoreResult<()> {
        ensure_parent_dir(&self.path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let mut record = Vec::new();
        // A crashed writer may have left half a line behind
        if has_torn_tail(&mut file)? {
            record.push(b'\n');
        }
        serde_json::to_writer(&mut record, entry)?;
        record.push(b'\n');

        file.write_all(&record)?;
        file.flush()?;
        Ok(())
    }

    fn read_all(&self) -> StoreResult<Vec<ErrorEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        // Records are split on raw bytes so a torn or binary line only loses itself
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<ErrorEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    "Skipping unreadable record at {}:{}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ),
            }
        }

        Ok(entries)
    }
}
