//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients from the crawler configuration
//! - GET requests, optionally through a proxy URL
//! - Retrying requests that failed without any response

use crate::classify::FailureContext;
use crate::config::CrawlerConfig;
use crate::crawler::spider::Page;
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// A response arrived and its body was read, whatever its status
    Response(Page),

    /// The download failed after the last attempt
    Failed(FailureContext),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use crawl_sentinel::config::CrawlerConfig;
/// use crawl_sentinel::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one request
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Any status, body read | Immediate → Response |
/// | Status received, body read failed | Immediate → Failed |
/// | No response (DNS, connect, timeout) | Retry up to `retry_times` → Failed |
///
/// Statuses are never retried here; whether a non-200 page ends the run is
/// decided by the retry coordinator.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The requested URL, used in the page and in failures
/// * `target` - The URL actually fetched (the proxy URL when proxying)
/// * `retry_times` - Extra attempts after a transport failure
pub async fn fetch_page(client: &Client, url: &str, target: &str, retry_times: u32) -> FetchOutcome {
    let mut attempt = 0;

    loop {
        match client.get(target).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                return match response.text().await {
                    Ok(body) => FetchOutcome::Response(Page {
                        url: url.to_string(),
                        status,
                        content_type,
                        body,
                    }),
                    Err(e) => failed(url, Some(status), describe(&e)),
                };
            }
            Err(e) if attempt < retry_times => {
                attempt += 1;
                tracing::debug!(
                    "Retrying {} ({}/{}): {}",
                    url,
                    attempt,
                    retry_times,
                    describe(&e)
                );
            }
            Err(e) => return failed(url, None, describe(&e)),
        }
    }
}

fn failed(url: &str, status: Option<u16>, cause: String) -> FetchOutcome {
    let failure = FailureContext::from_attempt(url, status, Some(cause.clone())).unwrap_or(
        FailureContext::TransportFailure {
            url: url.to_string(),
            cause,
        },
    );
    FetchOutcome::Failed(failure)
}

/// Short description of a transport error
fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection refused: {}", error)
    } else {
        error.to_string()
    }
}
