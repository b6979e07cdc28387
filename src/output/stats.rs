//! Statistics generation from the error log
//!
//! This module provides functionality for summarizing logged entries and
//! displaying them for the `summary` command.

use crate::classify::{ErrorCategory, ErrorCode};
use crate::logstore::{ErrorEntry, ErrorSink};
use crate::SentinelError;
use std::collections::BTreeMap;

/// Error log statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorStatistics {
    /// Total number of entries
    pub total: u64,

    /// Count of entries by category
    pub by_category: BTreeMap<ErrorCategory, u64>,

    /// Count of entries by code, with the most recent subcategory seen for it
    pub by_code: BTreeMap<ErrorCode, (String, u64)>,

    /// Count of entries by spider
    pub by_spider: BTreeMap<String, u64>,

    /// Timestamp of the first and last entry
    pub span: Option<(String, String)>,
}

/// Counts entries per category, code and spider
pub fn summarize(entries: &[ErrorEntry]) -> ErrorStatistics {
    let mut stats = ErrorStatistics::default();

    for entry in entries {
        stats.total += 1;
        *stats.by_category.entry(entry.category).or_insert(0) += 1;
        *stats.by_spider.entry(entry.spider.clone()).or_insert(0) += 1;

        let code = stats
            .by_code
            .entry(entry.code)
            .or_insert_with(|| (String::new(), 0));
        code.0 = entry.subcategory.clone();
        code.1 += 1;
    }

    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        stats.span = Some((first.timestamp.clone(), last.timestamp.clone()));
    }

    stats
}

/// Loads statistics from an error log
///
/// # Arguments
///
/// * `sink` - The error log to read
///
/// # Returns
///
/// * `Ok(ErrorStatistics)` - Successfully loaded statistics
/// * `Err(SentinelError)` - Failed to read the log
pub fn load_statistics(sink: &dyn ErrorSink) -> Result<ErrorStatistics, SentinelError> {
    let entries = sink.read_all()?;
    Ok(summarize(&entries))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ErrorStatistics) {
    println!("=== Error Log Statistics ===\n");

    println!("Overview:");
    println!("  Total entries: {}", stats.total);
    if let Some((first, last)) = &stats.span {
        println!("  First entry: {}", first);
        println!("  Last entry: {}", last);
    }
    println!();

    if stats.total == 0 {
        println!("No errors logged.");
        return;
    }

    println!("Entries by Category:");
    for category in ErrorCategory::all() {
        let count = stats.by_category.get(&category).copied().unwrap_or(0);
        let percentage = (count as f64 / stats.total as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", category, count, percentage);
    }
    println!();

    println!("Entries by Code:");
    for (code, (subcategory, count)) in &stats.by_code {
        println!("  {} {}: {}", code, subcategory, count);
    }
    println!();

    println!("Entries by Spider:");
    let mut spider_counts: Vec<_> = stats.by_spider.iter().collect();
    spider_counts.sort_by(|a, b| b.1.cmp(a.1));
    for (spider, count) in spider_counts {
        println!("  {}: {}", spider, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, FailureContext, ParseFailure};
    use crate::logstore::JsonArrayStore;
    use tempfile::TempDir;

    fn entry(failure: FailureContext, spider: &str, timestamp: &str) -> ErrorEntry {
        ErrorEntry::new(
            classify(&failure),
            spider,
            failure.url(),
            timestamp.to_string(),
        )
    }

    fn sample() -> Vec<ErrorEntry> {
        let url = "https://example.com/".to_string();
        vec![
            entry(
                FailureContext::BadStatus { status: 503, url: url.clone() },
                "listing",
                "2026-01-01 10:00:00",
            ),
            entry(
                FailureContext::BadStatus { status: 504, url: url.clone() },
                "listing",
                "2026-01-01 10:00:05",
            ),
            entry(
                FailureContext::Parse { url, failure: ParseFailure::NoItemsFound },
                "books",
                "2026-01-01 10:01:00",
            ),
        ]
    }

    #[test]
    fn test_summarize() {
        let stats = summarize(&sample());

        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_category[&ErrorCategory::CrawlingError], 2);
        assert_eq!(stats.by_category[&ErrorCategory::ParsingError], 1);
        assert!(!stats.by_category.contains_key(&ErrorCategory::SystemFailure));
        assert_eq!(
            stats.by_code[&ErrorCode::BAD_RESPONSE],
            ("504 Response".to_string(), 2)
        );
        assert_eq!(stats.by_spider["listing"], 2);
        assert_eq!(
            stats.span,
            Some((
                "2026-01-01 10:00:00".to_string(),
                "2026-01-01 10:01:00".to_string()
            ))
        );
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), ErrorStatistics::default());
    }

    #[test]
    fn test_load_statistics() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonArrayStore::open(dir.path().join("errors.json")).unwrap();
        for entry in sample() {
            store.append(&entry).unwrap();
        }

        let stats = load_statistics(&store).unwrap();
        assert_eq!(stats.total, 3);
    }
}
