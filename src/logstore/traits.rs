//! Error sink trait and error types
//!
//! This module defines the trait interface for error log backends and the
//! helpers they share for writing JSON documents to disk.

use crate::logstore::ErrorEntry;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during log store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for log store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for durable error log backends
///
/// Implementations exclusively own their file: every writer goes through the
/// sink, nothing else opens the path directly.
pub trait ErrorSink {
    /// Path of the backing file
    fn path(&self) -> &Path;

    /// Creates the containing directory and an empty, well-formed store if absent
    ///
    /// Idempotent and cheap when the store already exists; existing entries
    /// are never touched.
    fn ensure_ready(&self) -> StoreResult<()>;

    /// Appends one entry
    ///
    /// Unreadable existing content is treated as empty rather than failing
    /// the append.
    fn append(&mut self, entry: &ErrorEntry) -> StoreResult<()>;

    /// Reads every readable entry in write order
    fn read_all(&self) -> StoreResult<Vec<ErrorEntry>>;

    /// Writes the whole log as a single JSON array document
    fn export_json_array(&self, destination: &Path) -> StoreResult<usize> {
        let entries = self.read_all()?;
        write_atomically(destination, &to_pretty_json(&entries)?)?;
        Ok(entries.len())
    }
}

/// Serializes a value as pretty JSON indented with four spaces
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Creates the parent directory of `path` if it has one
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

/// Replaces `path` with `contents` via a sibling temp file and a rename
///
/// Readers observe either the old document or the new one, never a
/// partially written file.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    ensure_parent_dir(path)?;

    let tmp = temp_path_for(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

/// Returns true if both paths name the same file
///
/// Paths are compared after lexical normalization against the working
/// directory, and by their canonical form when both files exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (fs::canonicalize(a), fs::canonicalize(b)) {
        return a == b;
    }
    normalize_path(a) == normalize_path(b)
}

/// Makes `path` absolute and resolves `.` and `..` without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "errors".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
