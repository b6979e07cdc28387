//! Pure mapping from failures to the error taxonomy
//!
//! # Classification Rules
//!
//! | Failure | Category | Subcategory | Code |
//! |---------|----------|-------------|------|
//! | Status != 200 | CrawlingError | `<status> Response` | 1002 |
//! | Failure with response | CrawlingError | `<status> Response Error` | 1002 |
//! | Failure without response | CrawlingError | `Request Failure` | 1001 |
//! | Unknown spider | CrawlingError | `SpiderNotFound` | 1003 |
//! | Missing field | ParsingError | `Missing Required Data` | 2001 |
//! | Zero items | ParsingError | `No Items Found` | 2002 |
//! | Unexpected parse failure | ParsingError | `Unexpected Parsing Error` | 2003 |
//! | Pagination absent | ParsingError | `Missing Required Data - Pagination` | 2003 |
//! | Pagination extraction failed | ParsingError | `Pagination Error` | 2003 |
//! | Handler failure | SystemFailure | `SignalHandler - Internal Error` | 3001 |
//! | Spider runtime error | SystemFailure | `SpiderError - Runtime Error` | 3002 |
//! | Item dropped | SystemFailure | `ItemDropped - Validation Error` | 3003 |

use crate::classify::failure::{FailureContext, ParseFailure};
use crate::classify::taxonomy::{ErrorCategory, ErrorCode};

/// The classified form of a failure, before it is stamped and stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub subcategory: String,
    pub code: ErrorCode,
    pub message: String,
}

impl Classification {
    fn new(code: ErrorCode, subcategory: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: code.category(),
            subcategory: subcategory.into(),
            code,
            message: message.into(),
        }
    }
}

/// Classifies a failure
///
/// Deterministic: the same failure always produces the same classification.
///
/// # Example
///
/// ```
/// use crawl_sentinel::classify::{classify, ErrorCategory, ErrorCode, FailureContext};
///
/// let failure = FailureContext::BadStatus { status: 503, url: "https://example.com/".into() };
/// let classification = classify(&failure);
/// assert_eq!(classification.category, ErrorCategory::CrawlingError);
/// assert_eq!(classification.subcategory, "503 Response");
/// assert_eq!(classification.code, ErrorCode::BAD_RESPONSE);
/// ```
pub fn classify(failure: &FailureContext) -> Classification {
    match failure {
        FailureContext::BadStatus { status, url } => Classification::new(
            ErrorCode::BAD_RESPONSE,
            format!("{} Response", status),
            format!("{} response received from {}", status, url),
        ),

        FailureContext::ResponseFailure { status, url } => Classification::new(
            ErrorCode::BAD_RESPONSE,
            format!("{} Response Error", status),
            format!("{} response received from {}", status, url),
        ),

        FailureContext::TransportFailure { url, cause } => Classification::new(
            ErrorCode::REQUEST_FAILURE,
            "Request Failure",
            format!("Request failed for {}: {}", url, cause),
        ),

        FailureContext::SpiderNotFound { name } => Classification::new(
            ErrorCode::SPIDER_NOT_FOUND,
            "SpiderNotFound",
            format!("Spider not found: {}", name),
        ),

        FailureContext::Parse { url, failure } => classify_parse(url, failure),

        FailureContext::HandlerFailure { signal, cause } => Classification::new(
            ErrorCode::HANDLER_FAILURE,
            "SignalHandler - Internal Error",
            format!("Handler for '{}' failed: {}", signal, cause),
        ),

        FailureContext::RuntimeFailure { cause, .. } => Classification::new(
            ErrorCode::RUNTIME_ERROR,
            "SpiderError - Runtime Error",
            format!("Error occurred in spider: {}", cause),
        ),

        FailureContext::ItemRejected { reason, .. } => Classification::new(
            ErrorCode::ITEM_DROPPED,
            "ItemDropped - Validation Error",
            format!("Item dropped: {}", reason),
        ),
    }
}

fn classify_parse(url: &str, failure: &ParseFailure) -> Classification {
    match failure {
        ParseFailure::MissingRequiredData { fields } => {
            let message = if fields.is_empty() {
                format!("Missing required item data for URL: {}", url)
            } else {
                format!(
                    "Missing required item data for URL: {} (missing: {})",
                    url,
                    fields.join(", ")
                )
            };
            Classification::new(ErrorCode::MISSING_REQUIRED_DATA, "Missing Required Data", message)
        }

        ParseFailure::NoItemsFound => Classification::new(
            ErrorCode::NO_ITEMS_FOUND,
            "No Items Found",
            format!("No items found on page: {}", url),
        ),

        ParseFailure::Unexpected { cause } => Classification::new(
            ErrorCode::PARSING_FAILURE,
            "Unexpected Parsing Error",
            format!("Error occurred while parsing: {}", cause),
        ),

        ParseFailure::PaginationMissing => Classification::new(
            ErrorCode::PARSING_FAILURE,
            "Missing Required Data - Pagination",
            "Pagination element is missing but expected.",
        ),

        ParseFailure::PaginationFailed { cause } => Classification::new(
            ErrorCode::PARSING_FAILURE,
            "Pagination Error",
            format!("Failed to extract next page. {}", cause).trim_end().to_string(),
        ),
    }
}
