use crate::classify::FailureContext;
use crate::signals::SignalError;
use crate::state::CloseReason;
use std::fmt;
use std::str::FromStr;

/// The lifecycle events a handler can be connected to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    EngineStarted,
    EngineStopped,
    SpiderOpened,
    SpiderClosed,
    SpiderError,
    RequestFailed,
    RequestDropped,
    ResponseReceived,
    ItemScraped,
    ItemDropped,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EngineStarted => "engine_started",
            Self::EngineStopped => "engine_stopped",
            Self::SpiderOpened => "spider_opened",
            Self::SpiderClosed => "spider_closed",
            Self::SpiderError => "spider_error",
            Self::RequestFailed => "request_failed",
            Self::RequestDropped => "request_dropped",
            Self::ResponseReceived => "response_received",
            Self::ItemScraped => "item_scraped",
            Self::ItemDropped => "item_dropped",
        }
    }

    /// Returns every known signal
    pub fn all() -> [Self; 10] {
        [
            Self::EngineStarted,
            Self::EngineStopped,
            Self::SpiderOpened,
            Self::SpiderClosed,
            Self::SpiderError,
            Self::RequestFailed,
            Self::RequestDropped,
            Self::ResponseReceived,
            Self::ItemScraped,
            Self::ItemDropped,
        ]
    }
}

impl FromStr for SignalKind {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SignalError::UnknownSignal(s.to_string()))
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle event together with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    EngineStarted,
    EngineStopped,
    SpiderOpened {
        spider: String,
    },
    SpiderClosed {
        spider: String,
        reason: CloseReason,
    },
    SpiderError {
        spider: String,
        url: Option<String>,
        cause: String,
    },
    RequestFailed {
        spider: String,
        failure: FailureContext,
    },
    RequestDropped {
        spider: String,
        url: String,
        reason: String,
    },
    ResponseReceived {
        spider: String,
        url: String,
        status: u16,
    },
    ItemScraped {
        spider: String,
        url: String,
        fields: usize,
    },
    ItemDropped {
        spider: String,
        url: Option<String>,
        reason: String,
    },
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::EngineStarted => SignalKind::EngineStarted,
            Self::EngineStopped => SignalKind::EngineStopped,
            Self::SpiderOpened { .. } => SignalKind::SpiderOpened,
            Self::SpiderClosed { .. } => SignalKind::SpiderClosed,
            Self::SpiderError { .. } => SignalKind::SpiderError,
            Self::RequestFailed { .. } => SignalKind::RequestFailed,
            Self::RequestDropped { .. } => SignalKind::RequestDropped,
            Self::ResponseReceived { .. } => SignalKind::ResponseReceived,
            Self::ItemScraped { .. } => SignalKind::ItemScraped,
            Self::ItemDropped { .. } => SignalKind::ItemDropped,
        }
    }

    /// The spider the event belongs to; engine events have none
    pub fn spider(&self) -> Option<&str> {
        match self {
            Self::EngineStarted | Self::EngineStopped => None,
            Self::SpiderOpened { spider }
            | Self::SpiderClosed { spider, .. }
            | Self::SpiderError { spider, .. }
            | Self::RequestFailed { spider, .. }
            | Self::RequestDropped { spider, .. }
            | Self::ResponseReceived { spider, .. }
            | Self::ItemScraped { spider, .. }
            | Self::ItemDropped { spider, .. } => Some(spider),
        }
    }
}
