use crate::classify::{classify, FailureContext};
use crate::logstore::clock::LogClock;
use crate::logstore::{ErrorEntry, ErrorSink};

/// Classifies failures and appends them to the error log
///
/// One reporter is built per crawl job and handed to every handler through
/// the dispatch context. After `seal` nothing more is appended for the run.
pub struct ErrorReporter {
    sink: Box<dyn ErrorSink>,
    clock: LogClock,
    sealed: bool,
    reported: usize,
    last: Option<ErrorEntry>,
}

impl ErrorReporter {
    pub fn new(sink: Box<dyn ErrorSink>, clock: LogClock) -> Self {
        Self {
            sink,
            clock,
            sealed: false,
            reported: 0,
            last: None,
        }
    }

    /// Classifies a failure and appends exactly one entry for it
    ///
    /// Persistence errors are logged and swallowed: reporting never fails
    /// outward.
    ///
    /// # Returns
    ///
    /// * `Some(ErrorEntry)` - The entry that was produced
    /// * `None` - The run is closed and nothing was appended
    pub fn report(&mut self, spider: &str, failure: &FailureContext) -> Option<ErrorEntry> {
        if self.sealed {
            tracing::debug!("Run closed, not logging {:?}", failure);
            return None;
        }

        let entry = ErrorEntry::new(classify(failure), spider, failure.url(), self.clock.now());

        tracing::error!(
            "{} [{}] {}: {}",
            entry.category,
            entry.code,
            entry.subcategory,
            entry.message
        );

        if let Err(e) = self.sink.append(&entry) {
            tracing::error!(
                "Failed to persist error entry to {}: {}",
                self.sink.path().display(),
                e
            );
        }

        self.reported += 1;
        self.last = Some(entry.clone());
        Some(entry)
    }

    /// Stops appending entries for the current run
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Starts a new run on the same log
    pub fn reopen(&mut self) {
        self.sealed = false;
        self.reported = 0;
        self.last = None;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of entries produced since the run was opened
    pub fn reported_count(&self) -> usize {
        self.reported
    }

    /// The most recently produced entry
    pub fn last(&self) -> Option<&ErrorEntry> {
        self.last.as_ref()
    }

    pub fn sink(&self) -> &dyn ErrorSink {
        self.sink.as_ref()
    }
}
