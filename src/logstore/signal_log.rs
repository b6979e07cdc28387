//! Line-oriented log of crawl lifecycle signals
//!
//! Independent of the error schema: one formatted line per message,
//! `<timestamp> - <LEVEL> - <message>`, appended and never rewritten.

use crate::logstore::clock::LogClock;
use crate::logstore::traits::ensure_parent_dir;
use crate::logstore::StoreResult;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Severity written in front of a signal log message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalLevel {
    Info,
    Warning,
}

impl fmt::Display for SignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

/// Append-only informational log for lifecycle signals
#[derive(Debug, Clone)]
pub struct SignalLog {
    path: PathBuf,
    clock: LogClock,
}

impl SignalLog {
    pub fn new(path: impl Into<PathBuf>, clock: LogClock) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the containing directory if absent
    pub fn ensure_ready(&self) -> StoreResult<()> {
        ensure_parent_dir(&self.path)?;
        Ok(())
    }

    /// Appends an INFO line
    pub fn log(&mut self, message: &str) -> StoreResult<()> {
        self.log_with_level(SignalLevel::Info, message)
    }

    /// Appends a line with the given level
    pub fn log_with_level(&mut self, level: SignalLevel, message: &str) -> StoreResult<()> {
        match level {
            SignalLevel::Info => tracing::info!("{}", message),
            SignalLevel::Warning => tracing::warn!("{}", message),
        }

        ensure_parent_dir(&self.path)?;
        let line = format!("{} - {} - {}\n", self.clock.now(), level, message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
