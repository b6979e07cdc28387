use crate::classify::{Classification, ErrorCategory, ErrorCode};
use serde::{Deserialize, Serialize};

/// Placeholder written when a failure has no URL attached
pub const NOT_APPLICABLE: &str = "N/A";

/// One structured failure record as persisted by the log store
///
/// Entries are immutable once written. Reading accepts the `error_*` key
/// spelling used by older logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(alias = "error_category")]
    pub category: ErrorCategory,

    #[serde(alias = "error_subcategory")]
    pub subcategory: String,

    #[serde(alias = "error_code")]
    pub code: ErrorCode,

    #[serde(alias = "error_message")]
    pub message: String,

    pub spider: String,

    pub url: String,

    /// Wall clock in the configured timezone, second precision
    pub timestamp: String,
}

impl ErrorEntry {
    /// Stamps a classification with its spider, URL and time
    pub fn new(
        classification: Classification,
        spider: &str,
        url: Option<&str>,
        timestamp: String,
    ) -> Self {
        Self {
            category: classification.category,
            subcategory: classification.subcategory,
            code: classification.code,
            message: classification.message,
            spider: spider.to_string(),
            url: url.unwrap_or(NOT_APPLICABLE).to_string(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, FailureContext};

    #[test]
    fn test_entry_uses_sentinel_url() {
        let classification = classify(&FailureContext::SpiderNotFound {
            name: "ghost".to_string(),
        });
        let entry = ErrorEntry::new(classification, "ghost", None, "2024-01-01 00:00:00".into());
        assert_eq!(entry.url, NOT_APPLICABLE);
        assert_eq!(entry.code, ErrorCode::SPIDER_NOT_FOUND);
    }

    #[test]
    fn test_serialized_keys() {
        let classification = classify(&FailureContext::BadStatus {
            status: 503,
            url: "https://example.com/".to_string(),
        });
        let entry = ErrorEntry::new(
            classification,
            "listing",
            Some("https://example.com/"),
            "2024-01-01 05:30:00".into(),
        );
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["category"], "CrawlingError");
        assert_eq!(value["subcategory"], "503 Response");
        assert_eq!(value["code"], 1002);
        assert_eq!(value["spider"], "listing");
        assert_eq!(value["url"], "https://example.com/");
        assert_eq!(value["timestamp"], "2024-01-01 05:30:00");
    }

    #[test]
    fn test_reads_legacy_keys() {
        let legacy = r#"{
            "error_category": "Parsing Error",
            "error_subcategory": "No Items Found",
            "error_code": 2002,
            "error_message": "No items found on page: https://example.com/",
            "spider": "error",
            "url": "https://example.com/",
            "timestamp": "2024-01-01 00:00:00"
        }"#;
        let entry: ErrorEntry = serde_json::from_str(legacy).unwrap();
        assert_eq!(entry.category, ErrorCategory::ParsingError);
        assert_eq!(entry.code, ErrorCode::NO_ITEMS_FOUND);
    }
}
