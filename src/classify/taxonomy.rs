/// Error taxonomy: categories and stable numeric codes
///
/// Codes are grouped in ranges that belong to exactly one category:
/// `1000-1999` network and HTTP transport, `2000-2999` content and parsing,
/// `3000-3999` runtime and system failures.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Top-level classification of a logged failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Network, DNS, timeout and non-200 response failures
    #[serde(alias = "Crawling Error")]
    CrawlingError,

    /// Content extraction and pagination failures
    #[serde(alias = "Parsing Error")]
    ParsingError,

    /// Spider runtime, signal handler and item validation failures
    #[serde(alias = "System Failure")]
    SystemFailure,
}

impl ErrorCategory {
    /// Returns the range of codes owned by this category
    pub fn code_range(&self) -> RangeInclusive<u16> {
        match self {
            Self::CrawlingError => 1000..=1999,
            Self::ParsingError => 2000..=2999,
            Self::SystemFailure => 3000..=3999,
        }
    }

    /// Returns the category owning the given code, if any
    pub fn for_code(code: u16) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|category| category.code_range().contains(&code))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrawlingError => "CrawlingError",
            Self::ParsingError => "ParsingError",
            Self::SystemFailure => "SystemFailure",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::CrawlingError, Self::ParsingError, Self::SystemFailure]
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable numeric error identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(u16);

impl ErrorCode {
    // ===== Crawling (1xxx) =====
    /// Request failed without a response (DNS, timeout, connection)
    pub const REQUEST_FAILURE: Self = Self(1001);
    /// Non-200 response, either seen by the callback or attached to a failure
    pub const BAD_RESPONSE: Self = Self(1002);
    /// The runner was asked for a spider it does not know
    pub const SPIDER_NOT_FOUND: Self = Self(1003);

    // ===== Parsing (2xxx) =====
    pub const MISSING_REQUIRED_DATA: Self = Self(2001);
    pub const NO_ITEMS_FOUND: Self = Self(2002);
    /// Unexpected parse failures and both pagination failures share this code
    pub const PARSING_FAILURE: Self = Self(2003);

    // ===== System (3xxx) =====
    pub const HANDLER_FAILURE: Self = Self(3001);
    pub const RUNTIME_ERROR: Self = Self(3002);
    pub const ITEM_DROPPED: Self = Self(3003);

    /// Creates a code, rejecting values outside every category range
    pub fn new(code: u16) -> Option<Self> {
        ErrorCategory::for_code(code).map(|_| Self(code))
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns the category this code belongs to
    pub fn category(&self) -> ErrorCategory {
        match self.0 {
            1000..=1999 => ErrorCategory::CrawlingError,
            2000..=2999 => ErrorCategory::ParsingError,
            _ => ErrorCategory::SystemFailure,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
