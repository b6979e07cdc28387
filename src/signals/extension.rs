use crate::classify::FailureContext;
use crate::logstore::{LogStore, SignalLevel};
use crate::signals::{HandlerError, Signal, SignalDispatcher, SignalError, SignalKind};

/// The standard handler set: lifecycle lines go to the signal log and
/// failures are classified into the error log
pub struct ErrorLoggingExtension;

impl ErrorLoggingExtension {
    /// Connects a handler to every known signal
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All handlers were registered
    /// * `Err(SignalError)` - One of the signals already had a handler
    pub fn connect(dispatcher: &mut SignalDispatcher) -> Result<(), SignalError> {
        for kind in SignalKind::all() {
            dispatcher.connect(kind, handle)?;
        }
        Ok(())
    }
}

fn handle(signal: &Signal, store: &mut LogStore) -> Result<(), HandlerError> {
    match signal {
        Signal::EngineStarted => store.signals.log("Engine started.")?,

        Signal::EngineStopped => store.signals.log("Engine stopped.")?,

        Signal::SpiderOpened { spider } => {
            store.errors.reopen();
            store.signals.log(&format!("Spider {} opened.", spider))?;
        }

        Signal::SpiderClosed { spider, reason } => {
            store.errors.seal();
            store
                .signals
                .log(&format!("Spider {} closed. Reason: {}", spider, reason))?;
        }

        Signal::SpiderError { spider, url, cause } => {
            store.errors.report(
                spider,
                &FailureContext::RuntimeFailure {
                    url: url.clone(),
                    cause: cause.clone(),
                },
            );
        }

        Signal::RequestFailed { spider, failure } => {
            store.errors.report(spider, failure);
        }

        Signal::RequestDropped { url, reason, .. } => {
            store.signals.log_with_level(
                SignalLevel::Warning,
                &format!("Request dropped ({}): {}", reason, url),
            )?;
        }

        Signal::ResponseReceived { url, status, .. } => {
            store
                .signals
                .log(&format!("{} response received from {}", status, url))?;
        }

        Signal::ItemScraped { url, fields, .. } => {
            store
                .signals
                .log(&format!("Scraped item with {} fields from {}", fields, url))?;
        }

        Signal::ItemDropped {
            spider,
            url,
            reason,
        } => {
            store.errors.report(
                spider,
                &FailureContext::ItemRejected {
                    url: url.clone(),
                    reason: reason.clone(),
                },
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstore::test_store;
    use crate::state::CloseReason;
    use crate::ErrorCode;
    use tempfile::TempDir;

    fn dispatcher() -> SignalDispatcher {
        let mut dispatcher = SignalDispatcher::new();
        ErrorLoggingExtension::connect(&mut dispatcher).unwrap();
        dispatcher
    }

    #[test]
    fn test_connects_every_signal() {
        assert!(dispatcher().unconnected().is_empty());
    }

    #[test]
    fn test_connecting_twice_is_rejected() {
        let mut dispatcher = dispatcher();
        assert!(ErrorLoggingExtension::connect(&mut dispatcher).is_err());
    }

    #[test]
    fn test_lifecycle_lines() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(dir.path());
        let mut dispatcher = dispatcher();

        dispatcher.dispatch(
            &Signal::SpiderOpened {
                spider: "listing".to_string(),
            },
            &mut store,
        );
        dispatcher.dispatch(
            &Signal::SpiderClosed {
                spider: "listing".to_string(),
                reason: CloseReason::Finished,
            },
            &mut store,
        );

        let log = std::fs::read_to_string(store.signals.path()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - Spider listing opened."));
        assert!(lines[1].ends_with(" - INFO - Spider listing closed. Reason: finished"));
    }

    #[test]
    fn test_closed_spider_seals_reporter() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(dir.path());
        let mut dispatcher = dispatcher();

        dispatcher.dispatch(
            &Signal::SpiderClosed {
                spider: "listing".to_string(),
                reason: CloseReason::Aborted("seed failed".to_string()),
            },
            &mut store,
        );
        dispatcher.dispatch(
            &Signal::SpiderError {
                spider: "listing".to_string(),
                url: None,
                cause: "late".to_string(),
            },
            &mut store,
        );

        assert!(store.errors.is_sealed());
        assert!(store.errors.sink().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_reporter_sealed_when_signal_log_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(dir.path());
        // A directory in place of the signal log makes every write fail
        std::fs::create_dir(store.signals.path()).unwrap();
        let mut dispatcher = dispatcher();

        dispatcher.dispatch(
            &Signal::SpiderClosed {
                spider: "listing".to_string(),
                reason: CloseReason::Finished,
            },
            &mut store,
        );

        assert!(store.errors.is_sealed());
        // The handler failure itself arrives after close and is not appended
        assert!(store.errors.sink().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_failures_are_classified() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(dir.path());
        let mut dispatcher = dispatcher();

        dispatcher.dispatch(
            &Signal::SpiderError {
                spider: "listing".to_string(),
                url: Some("https://example.com/".to_string()),
                cause: "index out of range".to_string(),
            },
            &mut store,
        );
        dispatcher.dispatch(
            &Signal::RequestFailed {
                spider: "listing".to_string(),
                failure: FailureContext::TransportFailure {
                    url: "https://example.com/2".to_string(),
                    cause: "connection refused".to_string(),
                },
            },
            &mut store,
        );
        dispatcher.dispatch(
            &Signal::ItemDropped {
                spider: "listing".to_string(),
                url: None,
                reason: "missing url".to_string(),
            },
            &mut store,
        );

        let codes: Vec<ErrorCode> = store
            .errors
            .sink()
            .read_all()
            .unwrap()
            .iter()
            .map(|e| e.code)
            .collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::RUNTIME_ERROR,
                ErrorCode::REQUEST_FAILURE,
                ErrorCode::ITEM_DROPPED
            ]
        );
    }
}
