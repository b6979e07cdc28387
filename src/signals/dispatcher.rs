use crate::classify::FailureContext;
use crate::logstore::{LogStore, NOT_APPLICABLE};
use crate::signals::{HandlerError, Signal, SignalError, SignalKind};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A function run when its signal is dispatched
pub type Handler = Box<dyn FnMut(&Signal, &mut LogStore) -> Result<(), HandlerError>>;

/// Registration table from signal kind to its single handler
#[derive(Default)]
pub struct SignalDispatcher {
    handlers: BTreeMap<SignalKind, Handler>,
}

impl SignalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `kind`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The handler was registered
    /// * `Err(SignalError::AlreadyConnected)` - `kind` already has a handler
    pub fn connect<F>(&mut self, kind: SignalKind, handler: F) -> Result<(), SignalError>
    where
        F: FnMut(&Signal, &mut LogStore) -> Result<(), HandlerError> + 'static,
    {
        if self.handlers.contains_key(&kind) {
            return Err(SignalError::AlreadyConnected(kind));
        }
        self.handlers.insert(kind, Box::new(handler));
        Ok(())
    }

    /// Registers a handler by textual signal name
    pub fn connect_named<F>(&mut self, name: &str, handler: F) -> Result<(), SignalError>
    where
        F: FnMut(&Signal, &mut LogStore) -> Result<(), HandlerError> + 'static,
    {
        let kind: SignalKind = name.parse()?;
        self.connect(kind, handler)
    }

    pub fn is_connected(&self, kind: SignalKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Known signals that have no handler
    pub fn unconnected(&self) -> Vec<SignalKind> {
        SignalKind::all()
            .into_iter()
            .filter(|kind| !self.is_connected(*kind))
            .collect()
    }

    /// Runs the handler for `signal` on the calling thread
    ///
    /// An error or panic inside the handler is reported as a
    /// `SignalHandler - Internal Error` entry and goes no further.
    ///
    /// # Returns
    ///
    /// * `true` - A handler ran and succeeded
    /// * `false` - No handler is connected, or the handler failed
    pub fn dispatch(&mut self, signal: &Signal, store: &mut LogStore) -> bool {
        let kind = signal.kind();
        let Some(handler) = self.handlers.get_mut(&kind) else {
            tracing::trace!("No handler connected to {}", kind);
            return false;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler(signal, &mut *store)));

        let cause = match outcome {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => e.to_string(),
            Err(panic_info) => extract_panic_message(&panic_info),
        };

        tracing::warn!("Handler for {} failed: {}", kind, cause);
        store.errors.report(
            signal.spider().unwrap_or(NOT_APPLICABLE),
            &FailureContext::HandlerFailure {
                signal: kind.as_str().to_string(),
                cause,
            },
        );
        false
    }
}

fn extract_panic_message(panic_info: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for SignalDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalDispatcher")
            .field("connected", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
