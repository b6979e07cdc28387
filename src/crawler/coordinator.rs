//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one spider run:
//! - Emitting lifecycle signals to the dispatcher
//! - Managing the frontier queue
//! - Coordinating fetching, parsing and pagination
//! - Routing every failure into the error log exactly once
//! - Closing the run and exporting the error log

use crate::classify::{FailureContext, ParseFailure};
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchOutcome};
use crate::crawler::pipeline::{ItemPipeline, ValidationPipeline};
use crate::crawler::retry::{Decision, RetryCoordinator};
use crate::crawler::scheduler::{CrawlRequest, Frontier, RequestKind};
use crate::crawler::spider::{Item, Page, Spider};
use crate::logstore::LogStore;
use crate::proxy::{ProxyUsageMonitor, QuotaDecision};
use crate::signals::{ErrorLoggingExtension, Signal, SignalDispatcher};
use crate::state::{CloseReason, RunState};
use crate::SentinelError;
use reqwest::Client;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Summary of one finished run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub spider: String,
    /// Always `Closed`
    pub state: RunState,
    pub items: Vec<Item>,
    /// Requests accepted by the frontier
    pub requests: u64,
    /// Pages that were downloaded (any status)
    pub pages: u64,
    /// Entries appended to the error log during the run
    pub errors_logged: usize,
}

impl CrawlReport {
    pub fn close_reason(&self) -> Option<&CloseReason> {
        self.state.close_reason()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    store: LogStore,
    dispatcher: SignalDispatcher,
    client: Client,
    proxy: Option<ProxyUsageMonitor>,
    pipeline: Box<dyn ItemPipeline>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The standard handler set is connected to every signal.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - The log store for this job
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SentinelError)` - Failed to build the HTTP client
    pub fn new(config: Config, store: LogStore) -> Result<Self, SentinelError> {
        let client = build_http_client(&config.crawler)?;

        let mut dispatcher = SignalDispatcher::new();
        ErrorLoggingExtension::connect(&mut dispatcher)?;

        let unconnected = dispatcher.unconnected();
        if !unconnected.is_empty() {
            tracing::warn!("Signals without a handler: {:?}", unconnected);
        }

        Ok(Self {
            config,
            store,
            dispatcher,
            client,
            proxy: None,
            pipeline: Box::new(ValidationPipeline),
        })
    }

    /// Routes requests through the monitor's selected proxy provider
    pub fn with_proxy(mut self, monitor: ProxyUsageMonitor) -> Self {
        self.proxy = Some(monitor);
        self
    }

    pub fn with_pipeline(mut self, pipeline: Box<dyn ItemPipeline>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn proxy(&self) -> Option<&ProxyUsageMonitor> {
        self.proxy.as_ref()
    }

    fn emit(&mut self, signal: Signal) {
        self.dispatcher.dispatch(&signal, &mut self.store);
    }

    /// Runs one spider to completion
    ///
    /// `urls` replaces the spider's start URLs when non-empty. An aborted run
    /// is a normal outcome and is reported through the returned state.
    pub async fn run(
        &mut self,
        spider: &mut dyn Spider,
        urls: &[String],
    ) -> Result<CrawlReport, SentinelError> {
        let name = spider.name().to_string();
        let errors_before = self.store.errors.reported_count();

        self.emit(Signal::EngineStarted);
        self.emit(Signal::SpiderOpened {
            spider: name.clone(),
        });

        let mut retry = RetryCoordinator::new(name.clone());
        let mut frontier = Frontier::new(self.config.crawler.max_pages);
        let mut items = Vec::new();
        let mut pages = 0;

        let seeds = if urls.is_empty() {
            spider.start_urls()
        } else {
            urls.to_vec()
        };
        for seed in &seeds {
            self.enqueue(&mut frontier, &name, seed, RequestKind::Seed);
        }

        retry.begin()?;
        let mut reason = CloseReason::Finished;

        while let Some(request) = frontier.pop() {
            retry.resume()?;
            tracing::debug!("Processing URL: {}", request.url);

            let page = match self.download(&request).await {
                FetchOutcome::Response(page) => page,
                FetchOutcome::Failed(failure) => {
                    if let Decision::Abort(why) = self.route_failure(&mut retry, &request, failure) {
                        reason = CloseReason::Aborted(why);
                        break;
                    }
                    continue;
                }
            };
            pages += 1;

            self.emit(Signal::ResponseReceived {
                spider: name.clone(),
                url: page.url.clone(),
                status: page.status,
            });

            if let Some(failure) = FailureContext::from_attempt(&page.url, Some(page.status), None) {
                if let Decision::Abort(why) = self.route_failure(&mut retry, &request, failure) {
                    reason = CloseReason::Aborted(why);
                    break;
                }
                continue;
            }

            if let Some(next) = self.process_page(spider, &mut retry, &page, &mut items)? {
                self.enqueue(&mut frontier, &name, &next, RequestKind::FollowUp);
            }
        }

        let skipped = frontier.clear();
        if skipped > 0 {
            tracing::info!("Run closed with {} requests still pending", skipped);
        }

        let state = retry.close(reason.clone())?.clone();
        let errors_logged = self.store.errors.reported_count() - errors_before;

        self.emit(Signal::SpiderClosed {
            spider: name.clone(),
            reason,
        });

        match self.store.export() {
            Ok(Some(n)) => tracing::info!("Exported {} error entries", n),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to export error log: {}", e),
        }

        self.emit(Signal::EngineStopped);

        tracing::info!(
            "Spider {} {}: {} pages, {} items, {} errors",
            name,
            state,
            pages,
            items.len(),
            errors_logged
        );

        Ok(CrawlReport {
            spider: name,
            state,
            items,
            requests: frontier.issued(),
            pages,
            errors_logged,
        })
    }

    fn enqueue(&mut self, frontier: &mut Frontier, spider: &str, url: &str, kind: RequestKind) {
        if let Err(reason) = frontier.push(url, kind) {
            self.emit(Signal::RequestDropped {
                spider: spider.to_string(),
                url: url.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    /// Fetches a request, through the proxy when one is configured
    async fn download(&mut self, request: &CrawlRequest) -> FetchOutcome {
        let target = self
            .proxy
            .as_ref()
            .and_then(|monitor| monitor.proxy_url(&request.url))
            .unwrap_or_else(|| request.url.clone());

        let outcome = fetch_page(
            &self.client,
            &request.url,
            &target,
            self.config.crawler.retry_times,
        )
        .await;

        if let Some(monitor) = self.proxy.as_mut() {
            if let Some(QuotaDecision::Exhausted { provider }) = monitor.tick().await {
                tracing::warn!("Proxy quota exhausted on {}, requests go direct", provider);
                self.proxy = None;
            }
        }

        outcome
    }

    fn route_failure(
        &mut self,
        retry: &mut RetryCoordinator,
        request: &CrawlRequest,
        failure: FailureContext,
    ) -> Decision {
        retry.on_failure(request, failure, &mut self.dispatcher, &mut self.store)
    }

    /// Parses a 200 page and routes its items, issues and pagination
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` - The next page to request
    /// * `Ok(None)` - No further page from this one
    fn process_page(
        &mut self,
        spider: &mut dyn Spider,
        retry: &mut RetryCoordinator,
        page: &Page,
        items: &mut Vec<Item>,
    ) -> Result<Option<String>, SentinelError> {
        let name = spider.name().to_string();

        let output = match catch_unwind(AssertUnwindSafe(|| spider.parse(page))) {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                self.store.errors.report(
                    &name,
                    &FailureContext::Parse {
                        url: page.url.clone(),
                        failure: ParseFailure::Unexpected {
                            cause: e.to_string(),
                        },
                    },
                );
                return Ok(None);
            }
            Err(panic_info) => {
                let cause = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.emit(Signal::SpiderError {
                    spider: name,
                    url: Some(page.url.clone()),
                    cause,
                });
                return Ok(None);
            }
        };

        for failure in output.issues {
            self.store.errors.report(
                &name,
                &FailureContext::Parse {
                    url: page.url.clone(),
                    failure,
                },
            );
        }

        for item in output.items {
            let url = item.url.clone();
            match self.pipeline.process(item) {
                Ok(item) => {
                    self.emit(Signal::ItemScraped {
                        spider: name.clone(),
                        url,
                        fields: item.fields.len(),
                    });
                    items.push(item);
                }
                Err(dropped) => self.emit(Signal::ItemDropped {
                    spider: name.clone(),
                    url: Some(url).filter(|u| !u.is_empty()),
                    reason: dropped.to_string(),
                }),
            }
        }

        retry.on_pagination(&page.url, output.pagination, &mut self.store)
    }
}
