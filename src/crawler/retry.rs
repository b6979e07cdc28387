//! Routing of request failures and pagination outcomes
//!
//! Every failed request is classified exactly once. Whether the run goes on
//! depends on which request failed: a seed answering with a non-200 status
//! ends the run, everything else lets the crawl continue.

use crate::classify::{FailureContext, ParseFailure};
use crate::crawler::scheduler::{CrawlRequest, RequestKind};
use crate::crawler::spider::Pagination;
use crate::logstore::LogStore;
use crate::signals::{Signal, SignalDispatcher};
use crate::state::{CloseReason, RunState};
use crate::SentinelError;
use std::collections::HashSet;

/// What the engine does after a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    /// Close the run with this reason
    Abort(String),
}

/// Tracks the run state and which requests have already been reported
pub struct RetryCoordinator {
    spider: String,
    state: RunState,
    reported: HashSet<u64>,
}

impl RetryCoordinator {
    pub fn new(spider: impl Into<String>) -> Self {
        Self {
            spider: spider.into(),
            state: RunState::Started,
            reported: HashSet::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    fn advance(&mut self, next: RunState) -> Result<(), SentinelError> {
        self.state = self.state.transition(next)?;
        Ok(())
    }

    /// Moves a freshly opened run to crawling
    pub fn begin(&mut self) -> Result<(), SentinelError> {
        self.advance(RunState::Crawling)
    }

    /// Called before each request is fetched
    pub fn resume(&mut self) -> Result<(), SentinelError> {
        if self.state == RunState::Paginating {
            self.advance(RunState::Crawling)?;
        }
        Ok(())
    }

    /// Routes the failure of `request` into the error log and decides continuation
    ///
    /// A request id is routed at most once; later failures for the same id
    /// are ignored. Bad statuses are logged directly; every other failure goes
    /// through the `request_failed` signal.
    pub fn on_failure(
        &mut self,
        request: &CrawlRequest,
        failure: FailureContext,
        dispatcher: &mut SignalDispatcher,
        store: &mut LogStore,
    ) -> Decision {
        if self.state.is_terminal() || !self.reported.insert(request.id) {
            tracing::debug!("Ignoring repeated failure for request {}", request.id);
            return Decision::Continue;
        }

        let decision = match (&failure, request.kind) {
            (FailureContext::BadStatus { status, .. }, RequestKind::Seed)
            | (FailureContext::ResponseFailure { status, .. }, RequestKind::Seed) => {
                Decision::Abort(format!("{} Response", status))
            }
            _ => Decision::Continue,
        };

        match failure {
            FailureContext::BadStatus { .. } => {
                store.errors.report(&self.spider, &failure);
            }
            failure => {
                dispatcher.dispatch(
                    &Signal::RequestFailed {
                        spider: self.spider.clone(),
                        failure,
                    },
                    store,
                );
            }
        }

        decision
    }

    /// Logs the pagination outcome of a parsed page
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The next page to request
    /// * `None` - No next page (exhausted, absent or failed)
    pub fn on_pagination(
        &mut self,
        page_url: &str,
        pagination: Pagination,
        store: &mut LogStore,
    ) -> Result<Option<String>, SentinelError> {
        let failure = match pagination {
            Pagination::Next(next) => {
                if self.state == RunState::Crawling {
                    self.advance(RunState::Paginating)?;
                }
                return Ok(Some(next));
            }
            Pagination::Exhausted => {
                tracing::info!("Pagination exhausted at {}", page_url);
                return Ok(None);
            }
            Pagination::Absent { expected: false } => return Ok(None),
            Pagination::Absent { expected: true } => ParseFailure::PaginationMissing,
            Pagination::Failed(cause) => ParseFailure::PaginationFailed { cause },
        };

        store.errors.report(
            &self.spider,
            &FailureContext::Parse {
                url: page_url.to_string(),
                failure,
            },
        );
        Ok(None)
    }

    /// Closes the run
    pub fn close(&mut self, reason: CloseReason) -> Result<&RunState, SentinelError> {
        self.advance(RunState::Closed(reason))?;
        Ok(&self.state)
    }
}
