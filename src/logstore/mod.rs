//! Log store for classified errors and lifecycle signals
//!
//! This module owns every log file the crate writes:
//! - The error log, behind the `ErrorSink` trait, as either a JSON array
//!   document (`JsonArrayStore`) or an append-only journal (`JournalStore`)
//! - The line-oriented signal log (`SignalLog`)
//! - Fixed-timezone timestamps (`LogClock`)
//! - The per-job `ErrorReporter` that classifies and appends failures

mod clock;
mod entry;
mod journal;
mod json_array;
mod reporter;
mod signal_log;
mod traits;

pub use clock::{LogClock, DEFAULT_TIMEZONE, TIMESTAMP_FORMAT};
pub use entry::{ErrorEntry, NOT_APPLICABLE};
pub use journal::JournalStore;
pub use json_array::JsonArrayStore;
pub use reporter::ErrorReporter;
pub use signal_log::{SignalLevel, SignalLog};
pub use traits::{same_file, ErrorSink, StoreError, StoreResult};

use crate::config::{LogFormat, LoggingConfig};
use crate::SentinelError;
use std::path::{Path, PathBuf};

/// Opens the error log backend selected by the configuration
pub fn open_error_sink(config: &LoggingConfig) -> StoreResult<Box<dyn ErrorSink>> {
    let path = Path::new(&config.error_log);
    let sink: Box<dyn ErrorSink> = match config.format {
        LogFormat::JsonArray => Box::new(JsonArrayStore::open(path)?),
        LogFormat::Journal => Box::new(JournalStore::open(path)?),
    };
    Ok(sink)
}

/// Every log written for one crawl job
///
/// Handlers receive the store by mutable reference through the signal
/// dispatcher; there is no process-wide logger.
pub struct LogStore {
    pub errors: ErrorReporter,
    pub signals: SignalLog,
    export_path: Option<PathBuf>,
}

impl LogStore {
    pub fn new(errors: ErrorReporter, signals: SignalLog) -> Self {
        Self {
            errors,
            signals,
            export_path: None,
        }
    }

    /// Opens and bootstraps every log file named by the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(LogStore)` - Both logs exist and are well-formed
    /// * `Err(SentinelError)` - The timezone is unknown or a file could not be created
    pub fn open(config: &LoggingConfig) -> Result<Self, SentinelError> {
        let clock = LogClock::new(&config.timezone)?;
        let sink = open_error_sink(config)?;

        let signals = SignalLog::new(&config.signal_log, clock);
        signals.ensure_ready()?;

        let mut store = Self::new(ErrorReporter::new(sink, clock), signals);
        store.export_path = config
            .json_export
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Ok(store)
    }

    /// Sets where the JSON array view of the error log is written
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn export_path(&self) -> Option<&Path> {
        self.export_path.as_deref()
    }

    /// Writes the JSON array view of the error log, if one is configured
    ///
    /// # Returns
    ///
    /// * `Ok(Some(n))` - The view was written with `n` entries
    /// * `Ok(None)` - No export path is configured, or it names one of the live logs
    pub fn export(&self) -> StoreResult<Option<usize>> {
        let Some(path) = &self.export_path else {
            return Ok(None);
        };

        if same_file(path, self.errors.sink().path()) || same_file(path, self.signals.path()) {
            tracing::warn!(
                "Export path {} is one of the live logs, skipping export",
                path.display()
            );
            return Ok(None);
        }

        let written = self.errors.sink().export_json_array(path)?;
        tracing::debug!("Exported {} entries to {}", written, path.display());
        Ok(Some(written))
    }
}

/// A JSON-array backed store under `dir`, for unit tests
#[cfg(test)]
pub(crate) fn test_store(dir: &Path) -> LogStore {
    let clock = LogClock::default();
    let sink = JsonArrayStore::open(dir.join("errors.json")).expect("bootstrap error log");
    let signals = SignalLog::new(dir.join("signals.log"), clock);
    LogStore::new(ErrorReporter::new(Box::new(sink), clock), signals)
}
