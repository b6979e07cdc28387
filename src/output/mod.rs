//! Output module for crawl and error log summaries
//!
//! This module handles:
//! - Summarizing the error log per category, code and spider
//! - Printing the outcome of a spider run

pub mod stats;

pub use stats::{load_statistics, print_statistics, summarize, ErrorStatistics};

use crate::crawler::CrawlReport;

/// Prints the outcome of one spider run to stdout
///
/// # Arguments
///
/// * `report` - The finished run
pub fn print_run_report(report: &CrawlReport) {
    println!("=== Run Summary: {} ===\n", report.spider);

    match report.close_reason() {
        Some(reason) if reason.is_aborted() => println!("  Outcome: aborted ({})", reason),
        _ => println!("  Outcome: finished"),
    }
    println!("  Requests issued: {}", report.requests);
    println!("  Pages downloaded: {}", report.pages);
    println!("  Items scraped: {}", report.items.len());
    println!("  Errors logged: {}", report.errors_logged);
}
