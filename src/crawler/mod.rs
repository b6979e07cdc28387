//! Crawler module for running spiders
//!
//! This module contains a small single-threaded crawl engine, including:
//! - HTTP fetching with transport retries
//! - A selector-driven listing spider
//! - A frontier with duplicate filtering and a request limit
//! - Failure routing and run state (`RetryCoordinator`)
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod pipeline;
mod retry;
mod scheduler;
mod spider;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{build_http_client, fetch_page, FetchOutcome};
pub use parser::ListingSpider;
pub use pipeline::{DropItem, ItemPipeline, ValidationPipeline};
pub use retry::{Decision, RetryCoordinator};
pub use scheduler::{CrawlRequest, DropReason, Frontier, RequestKind};
pub use spider::{Item, Page, Pagination, ParseError, ParseOutput, Spider, SpiderRegistry};

use crate::classify::FailureContext;
use crate::config::Config;
use crate::logstore::LogStore;
use crate::proxy::{ProxyConfig, ProxyUsageMonitor};
use crate::SentinelError;

/// Runs the named spider with a fresh log store
///
/// This is the main entry point for a crawl. It will:
/// 1. Open and bootstrap the log files
/// 2. Look up the spider, logging `SpiderNotFound` if it is unknown
/// 3. Set up the proxy monitor when proxying is enabled
/// 4. Run the spider to completion
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `name` - The spider to run
/// * `urls` - Start URLs overriding the spider's own, if any
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run closed, finished or aborted
/// * `Err(SentinelError::SpiderNotFound)` - No spider has that name
/// * `Err(SentinelError)` - The log store or HTTP client could not be set up
pub async fn run_spider(
    config: Config,
    name: &str,
    urls: &[String],
) -> Result<CrawlReport, SentinelError> {
    let mut store = LogStore::open(&config.logging)?;

    let registry = SpiderRegistry::from_config(&config);
    let mut spider = match registry.create(name) {
        Ok(spider) => spider,
        Err(SentinelError::SpiderNotFound(_)) => {
            store.errors.report(
                name,
                &FailureContext::SpiderNotFound {
                    name: name.to_string(),
                },
            );
            if let Err(e) = store.export() {
                tracing::warn!("Failed to export error log: {}", e);
            }
            return Err(SentinelError::SpiderNotFound(name.to_string()));
        }
        Err(e) => return Err(e),
    };

    let proxy = if config.crawler.use_proxy {
        let monitor = ProxyUsageMonitor::new(ProxyConfig::from_env(&config.proxy)?, &config.proxy)?;
        tracing::info!(
            "Routing requests through {}",
            monitor.selected().unwrap_or("no provider")
        );
        Some(monitor)
    } else {
        None
    };

    let mut coordinator = Coordinator::new(config, store)?;
    if let Some(monitor) = proxy {
        coordinator = coordinator.with_proxy(monitor);
    }

    coordinator.run(spider.as_mut(), urls).await
}
