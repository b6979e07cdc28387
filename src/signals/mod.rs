//! Crawl lifecycle signals and their handlers
//!
//! The engine emits a `Signal` for every lifecycle event. The
//! `SignalDispatcher` runs the one handler registered for that event
//! synchronously, handing it the job's `LogStore`. Handler failures never
//! escape dispatch; they become `SystemFailure` entries.

mod dispatcher;
mod extension;
mod kinds;

pub use dispatcher::{Handler, SignalDispatcher};
pub use extension::ErrorLoggingExtension;
pub use kinds::{Signal, SignalKind};

use crate::logstore::StoreError;
use thiserror::Error;

/// Errors raised while wiring handlers to signals
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    #[error("A handler is already connected to {0}")]
    AlreadyConnected(SignalKind),
}

/// Failure returned by a signal handler
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self(err.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}
