//! Tagged failure shapes reported by the crawl engine
//!
//! Every failure the engine, a spider or a signal handler can produce is
//! expressed as one `FailureContext` variant. Classification is a pure
//! function over this type.

/// Parsing failures raised while extracting items or pagination from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// A listing candidate lacked one or more required fields
    MissingRequiredData { fields: Vec<String> },

    /// The page yielded no item candidates at all
    NoItemsFound,

    /// The page could not be parsed for an unexpected reason
    Unexpected { cause: String },

    /// The pagination control was expected but is absent from the page
    PaginationMissing,

    /// The pagination control was found but no next link could be extracted
    PaginationFailed { cause: String },
}

/// A single failure observed during a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureContext {
    /// A response arrived with a status other than 200
    BadStatus { status: u16, url: String },

    /// The request failed but a response was attached to the failure
    ResponseFailure { status: u16, url: String },

    /// The request failed without any response (DNS, timeout, connection)
    TransportFailure { url: String, cause: String },

    /// The spider raised while handling an event
    RuntimeFailure { url: Option<String>, cause: String },

    /// A signal handler itself failed
    HandlerFailure { signal: String, cause: String },

    /// The item pipeline rejected an item
    ItemRejected { url: Option<String>, reason: String },

    /// Extraction failed on a fetched page
    Parse { url: String, failure: ParseFailure },

    /// The runner was asked for a spider it does not know
    SpiderNotFound { name: String },
}

impl FailureContext {
    /// Builds the failure for one download attempt, if it failed
    ///
    /// A non-200 status always wins over a transport error: once the status
    /// check fails, nothing else about the attempt is considered.
    ///
    /// # Arguments
    ///
    /// * `url` - The requested URL
    /// * `status` - The response status, if a response was received
    /// * `transport_error` - The transport error, if the attempt errored
    ///
    /// # Returns
    ///
    /// * `None` - The attempt succeeded with a 200 response
    /// * `Some(FailureContext)` - The failure describing the attempt
    pub fn from_attempt(
        url: &str,
        status: Option<u16>,
        transport_error: Option<String>,
    ) -> Option<Self> {
        if let Some(status) = status.filter(|s| *s != 200) {
            return Some(Self::BadStatus {
                status,
                url: url.to_string(),
            });
        }

        match (status, transport_error) {
            (Some(status), Some(_)) => Some(Self::ResponseFailure {
                status,
                url: url.to_string(),
            }),
            (None, Some(cause)) => Some(Self::TransportFailure {
                url: url.to_string(),
                cause,
            }),
            (_, None) => None,
        }
    }

    /// Returns the URL the failure relates to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::BadStatus { url, .. }
            | Self::ResponseFailure { url, .. }
            | Self::TransportFailure { url, .. }
            | Self::Parse { url, .. } => Some(url),
            Self::RuntimeFailure { url, .. } | Self::ItemRejected { url, .. } => url.as_deref(),
            Self::HandlerFailure { .. } | Self::SpiderNotFound { .. } => None,
        }
    }

    /// Returns true if this failure came from the download layer
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            Self::BadStatus { .. } | Self::ResponseFailure { .. } | Self::TransportFailure { .. }
        )
    }
}
