/// Run state definitions for one spider run
///
/// A run moves `Started -> Crawling <-> Paginating -> Closed`. Once closed it
/// never moves again, and nothing is appended to the error log after that.
use crate::SentinelError;
use std::fmt;

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The frontier drained or pagination was exhausted
    Finished,

    /// The run was stopped early (e.g. the seed request failed)
    Aborted(String),
}

impl CloseReason {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::Aborted(reason) => write!(f, "{}", reason),
        }
    }
}

/// Represents the current state of a spider run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunState {
    // ===== Active States =====
    /// The spider was opened but no request has been issued yet
    Started,

    /// Requests from the frontier are being downloaded and parsed
    Crawling,

    /// A next-page request was scheduled from a parsed page
    Paginating,

    // ===== Terminal State =====
    /// The spider was closed; `spider_closed` carries the reason
    Closed(CloseReason),
}

impl RunState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// Returns true if the run may still issue requests
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Any active state may close; `Crawling` and `Paginating` alternate.
    pub fn can_transition_to(&self, next: &RunState) -> bool {
        match (self, next) {
            (Self::Closed(_), _) => false,
            (_, Self::Closed(_)) => true,
            (Self::Started, Self::Crawling) => true,
            (Self::Crawling, Self::Paginating) => true,
            (Self::Paginating, Self::Crawling) => true,
            _ => false,
        }
    }

    /// Validates and returns the successor state
    ///
    /// # Returns
    ///
    /// * `Ok(RunState)` - The new state
    /// * `Err(SentinelError::InvalidTransition)` - `next` is not reachable from here
    pub fn transition(&self, next: RunState) -> Result<RunState, SentinelError> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(SentinelError::InvalidTransition {
                from: self.clone(),
                to: next,
            })
        }
    }

    /// Returns the close reason for a closed run
    pub fn close_reason(&self) -> Option<&CloseReason> {
        match self {
            Self::Closed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Crawling => "crawling",
            Self::Paginating => "paginating",
            Self::Closed(CloseReason::Finished) => "closed",
            Self::Closed(CloseReason::Aborted(_)) => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aborted() -> RunState {
        RunState::Closed(CloseReason::Aborted("seed failed".to_string()))
    }

    #[test]
    fn test_is_terminal() {
        assert!(!RunState::Started.is_terminal());
        assert!(!RunState::Crawling.is_terminal());
        assert!(!RunState::Paginating.is_terminal());

        assert!(RunState::Closed(CloseReason::Finished).is_terminal());
        assert!(aborted().is_terminal());
    }

    #[test]
    fn test_is_active() {
        assert!(RunState::Started.is_active());
        assert!(RunState::Paginating.is_active());
        assert!(!aborted().is_active());
    }

    #[test]
    fn test_valid_transitions() {
        let state = RunState::Started.transition(RunState::Crawling).unwrap();
        let state = state.transition(RunState::Paginating).unwrap();
        let state = state.transition(RunState::Crawling).unwrap();
        let state = state
            .transition(RunState::Closed(CloseReason::Finished))
            .unwrap();

        assert_eq!(state.close_reason(), Some(&CloseReason::Finished));
    }

    #[test]
    fn test_any_active_state_can_close() {
        assert!(RunState::Started.can_transition_to(&aborted()));
        assert!(RunState::Crawling.can_transition_to(&aborted()));
        assert!(RunState::Paginating.can_transition_to(&aborted()));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!RunState::Started.can_transition_to(&RunState::Paginating));
        assert!(!RunState::Crawling.can_transition_to(&RunState::Started));
        assert!(!RunState::Crawling.can_transition_to(&RunState::Crawling));

        let err = RunState::Closed(CloseReason::Finished)
            .transition(RunState::Crawling)
            .unwrap_err();
        assert!(matches!(err, SentinelError::InvalidTransition { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid run state transition: closed -> crawling"
        );
    }

    #[test]
    fn test_closed_is_final() {
        assert!(!aborted().can_transition_to(&RunState::Closed(CloseReason::Finished)));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RunState::Started), "started");
        assert_eq!(format!("{}", RunState::Paginating), "paginating");
        assert_eq!(format!("{}", aborted()), "aborted");
        assert_eq!(format!("{}", CloseReason::Finished), "finished");
        assert_eq!(
            format!("{}", CloseReason::Aborted("seed failed".to_string())),
            "seed failed"
        );
    }
}
