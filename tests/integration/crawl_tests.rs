//! Integration tests for the crawl engine and error log
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! spider jobs end-to-end against on-disk logs in a temporary directory.

use crawl_sentinel::config::{Config, LogFormat, LoggingConfig, ProxySettings};
use crawl_sentinel::crawler::{run_spider, Coordinator, CrawlReport, SpiderRegistry};
use crawl_sentinel::logstore::{ErrorEntry, ErrorSink, JsonArrayStore};
use crawl_sentinel::proxy::{
    ProviderEntry, ProxyConfig, ProxyUsageMonitor, QuotaDecision, UsageEndpoint,
};
use crawl_sentinel::{CloseReason, ErrorCategory, ErrorCode, LogStore, RunState, SentinelError};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ===== Helpers =====

/// Creates a test configuration whose logs live in `dir`
fn create_test_config(dir: &TempDir) -> Config {
    let file = |name: &str| dir.path().join(name).to_string_lossy().into_owned();

    let mut config = Config::default();
    config.logging = LoggingConfig {
        error_log: file("logs/errors.jsonl"),
        format: LogFormat::Journal,
        signal_log: file("logs/signals.log"),
        timezone: "Asia/Kolkata".to_string(),
        json_export: Some(file("logs/errors.json")),
    };
    config.crawler.retry_times = 0;
    config.crawler.request_timeout = 5;
    config.spiders[0].name = "listing".to_string();
    config
}

fn card(name: &str, price: Option<&str>) -> String {
    let price = price
        .map(|p| format!(r#"<span class="a-price-whole">{}</span>"#, p))
        .unwrap_or_default();
    format!(
        r#"<div class="puis-card-border">
             <h2 class="a-color-base a-text-normal"><span>{}</span></h2>
             {}
             <i class="a-icon-star-small"><span class="a-icon-alt">4 out of 5 stars</span></i>
           </div>"#,
        name, price
    )
}

fn listing(cards: &str, pagination: &str) -> ResponseTemplate {
    let body = format!("<html><body>{}{}</body></html>", cards, pagination);
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

fn next_link(href: &str) -> String {
    format!(r#"<a class="s-pagination-next" href="{}">Next</a>"#, href)
}

const DISABLED_NEXT: &str =
    r#"<span class="s-pagination-next s-pagination-disabled">Next</span>"#;

/// Runs the "listing" spider and returns the report, the error log and the signal log
async fn run_listing(config: Config, urls: Vec<String>) -> (CrawlReport, Vec<ErrorEntry>, String) {
    let store = LogStore::open(&config.logging).expect("Failed to open log store");
    let signal_log = store.signals.path().to_path_buf();
    let mut spider = SpiderRegistry::from_config(&config)
        .create("listing")
        .expect("Failed to create spider");

    let mut coordinator = Coordinator::new(config, store).expect("Failed to create coordinator");
    let report = coordinator
        .run(spider.as_mut(), &urls)
        .await
        .expect("Crawl failed");

    let entries = coordinator
        .store()
        .errors
        .sink()
        .read_all()
        .expect("Failed to read error log");
    let signals = std::fs::read_to_string(signal_log).unwrap_or_default();

    (report, entries, signals)
}

fn codes(entries: &[ErrorEntry]) -> Vec<u16> {
    entries.iter().map(|e| e.code.value()).collect()
}

// ===== Crawl scenarios =====

#[tokio::test]
async fn test_seed_bad_status_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(501).set_body_raw(
            format!("<html><body>{}</body></html>", next_link("/s/2")).into_bytes(),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The next page must never be requested
    Mock::given(method("GET"))
        .and(path("/s/2"))
        .respond_with(listing(&card("A", Some("1")), ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let export = dir.path().join("logs/errors.json");
    let (report, entries, signals) = run_listing(config, vec![format!("{}/s", base_url)]).await;

    assert_eq!(
        report.state,
        RunState::Closed(CloseReason::Aborted("501 Response".to_string()))
    );
    assert!(report.items.is_empty());

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, ErrorCategory::CrawlingError);
    assert_eq!(entries[0].subcategory, "501 Response");
    assert_eq!(entries[0].code, ErrorCode::BAD_RESPONSE);
    assert_eq!(entries[0].spider, "listing");
    assert_eq!(entries[0].url, format!("{}/s", base_url));

    assert!(signals.contains("Spider listing closed. Reason: 501 Response"));

    // The JSON array view is written when the spider closes
    let exported = JsonArrayStore::new(export).read_all().unwrap();
    assert_eq!(exported, entries);
}

#[tokio::test]
async fn test_exhausted_pagination_logs_no_parse_errors() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let two_cards = format!("{}{}", card("A", Some("10")), card("B", Some("20")));
    for (page, pagination) in [
        ("/page/1", next_link("/page/2")),
        ("/page/2", next_link("/page/3")),
        ("/page/3", DISABLED_NEXT.to_string()),
    ] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(listing(&two_cards, &pagination))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.spiders[0].expect_pagination = true;
    let (report, entries, _) =
        run_listing(config, vec![format!("{}/page/1", base_url)]).await;

    assert_eq!(report.state, RunState::Closed(CloseReason::Finished));
    assert_eq!(report.pages, 3);
    assert_eq!(report.items.len(), 6);
    assert!(!codes(&entries).contains(&2003));
    assert!(entries.is_empty(), "unexpected entries: {:?}", entries);
}

#[tokio::test]
async fn test_card_missing_price_is_logged_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let cards: String = (1..=10)
        .map(|i| card(&format!("Item {}", i), if i == 4 { None } else { Some("499") }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(listing(&cards, ""))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let (report, entries, _) =
        run_listing(create_test_config(&dir), vec![format!("{}/s", base_url)]).await;

    assert_eq!(report.items.len(), 9);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, ErrorCategory::ParsingError);
    assert_eq!(entries[0].subcategory, "Missing Required Data");
    assert_eq!(entries[0].code, ErrorCode::MISSING_REQUIRED_DATA);
}

#[tokio::test]
async fn test_follow_up_failure_continues_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(listing(&card("A", Some("1")), &next_link("/broken")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(listing(&card("B", Some("2")), &next_link("/c")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Fetched after the failure
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(listing(&card("C", Some("3")), ""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls = vec![format!("{}/a", base_url), format!("{}/b", base_url)];
    let (report, entries, _) = run_listing(create_test_config(&dir), urls).await;

    assert_eq!(report.state, RunState::Closed(CloseReason::Finished));
    assert_eq!(report.items.len(), 3);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].subcategory, "503 Response");
    assert_eq!(entries[0].url, format!("{}/broken", base_url));
}

#[tokio::test]
async fn test_unreachable_seed_is_request_failure() {
    let dir = TempDir::new().unwrap();

    // Nothing listens on port 9
    let (report, entries, _) = run_listing(
        create_test_config(&dir),
        vec!["http://127.0.0.1:9/s".to_string()],
    )
    .await;

    assert_eq!(report.state, RunState::Closed(CloseReason::Finished));
    assert_eq!(codes(&entries), vec![1001]);
    assert_eq!(entries[0].subcategory, "Request Failure");
    assert!(entries[0].message.starts_with("Request failed for http://127.0.0.1:9/s: "));
}

#[tokio::test]
async fn test_duplicate_request_is_dropped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The page links to itself
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(listing(&card("A", Some("1")), &next_link("/s#top")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let (report, entries, signals) =
        run_listing(create_test_config(&dir), vec![format!("{}/s", base_url)]).await;

    assert_eq!(report.requests, 1);
    assert!(entries.is_empty());
    assert!(signals.contains("WARNING - Request dropped (duplicate)"));
}

#[tokio::test]
async fn test_non_html_page_is_parsing_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let (_, entries, signals) =
        run_listing(create_test_config(&dir), vec![format!("{}/api", base_url)]).await;

    assert_eq!(codes(&entries), vec![2003]);
    assert_eq!(entries[0].subcategory, "Unexpected Parsing Error");
    assert!(signals.contains(&format!("200 response received from {}/api", base_url)));
}

#[tokio::test]
async fn test_signal_log_lifecycle() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(listing(&card("A", Some("1")), ""))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let (_, _, signals) =
        run_listing(create_test_config(&dir), vec![format!("{}/s", base_url)]).await;

    let messages: Vec<&str> = signals
        .lines()
        .filter_map(|line| line.splitn(3, " - ").nth(2))
        .collect();
    assert_eq!(messages.first(), Some(&"Engine started."));
    assert!(messages.contains(&"Spider listing opened."));
    assert!(messages.contains(&"Spider listing closed. Reason: finished"));
    assert_eq!(messages.last(), Some(&"Engine stopped."));
}

#[tokio::test]
async fn test_unknown_spider_is_logged() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let error_log = config.logging.error_log.clone();

    let result = run_spider(config, "nope", &[]).await;
    assert!(matches!(result, Err(SentinelError::SpiderNotFound(name)) if name == "nope"));

    let contents = std::fs::read_to_string(error_log).unwrap();
    let entries: Vec<ErrorEntry> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, ErrorCategory::CrawlingError);
    assert_eq!(entries[0].subcategory, "SpiderNotFound");
    assert_eq!(entries[0].code, ErrorCode::SPIDER_NOT_FOUND);
    assert_eq!(entries[0].url, "N/A");
}

// ===== Proxied crawl =====

#[tokio::test]
async fn test_proxied_crawl_goes_direct_after_quota_exhaustion() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // First page goes through the provider endpoint
    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(query_param("url", format!("{}/p1", base_url).as_str()))
        .and(query_param("api_key", "k1"))
        .and(query_param("country_code", "US"))
        .respond_with(listing(&card("A", Some("1")), &next_link("/p2")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .and(query_param("api_key", "k1"))
        .respond_with(usage_body(1000, 1000))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Second page is fetched directly once the only provider is used up
    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(listing(&card("B", Some("2")), ""))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p1"))
        .respond_with(listing(&card("A", Some("1")), ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.proxy.quota_check_interval = 1;

    let mut provider = provider(
        "scraperapi",
        Some("k1"),
        Some(format!("{}/account", base_url)),
    );
    provider.base_url = format!("{}/proxy", base_url);
    let monitor = ProxyUsageMonitor::new(ProxyConfig::new(vec![provider]), &config.proxy)
        .expect("Failed to build monitor");

    let store = LogStore::open(&config.logging).expect("Failed to open log store");
    let mut spider = SpiderRegistry::from_config(&config)
        .create("listing")
        .expect("Failed to create spider");
    let mut coordinator = Coordinator::new(config, store)
        .expect("Failed to create coordinator")
        .with_proxy(monitor);
    assert_eq!(
        coordinator.proxy().and_then(|m| m.selected()),
        Some("scraperapi")
    );

    let report = coordinator
        .run(spider.as_mut(), &[format!("{}/p1", base_url)])
        .await
        .expect("Crawl failed");

    assert_eq!(report.state, RunState::Closed(CloseReason::Finished));
    assert_eq!(report.items.len(), 2);
    // Page URLs stay the requested ones, not the provider URL
    assert_eq!(report.items[0].url, format!("{}/p1", base_url));
    assert!(coordinator.proxy().is_none());
}

#[tokio::test]
async fn test_run_spider_with_proxy_but_no_keys_goes_direct() {
    std::env::remove_var("SCRAPER_API_KEY");
    std::env::remove_var("SCRAPEOPS_API_KEY");

    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(listing(&card("A", Some("1")), ""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.crawler.use_proxy = true;

    let report = run_spider(config, "listing", &[format!("{}/s", base_url)])
        .await
        .expect("Crawl failed");

    assert_eq!(report.state, RunState::Closed(CloseReason::Finished));
    assert_eq!(report.items.len(), 1);
}

// ===== Proxy quota =====

fn provider(name: &str, key: Option<&str>, usage: Option<String>) -> ProviderEntry {
    ProviderEntry {
        name: name.to_string(),
        base_url: format!("https://{}.example.com/", name),
        api_key: key.map(str::to_string),
        params: vec![("country_code".to_string(), "US".to_string())],
        usage: usage.map(UsageEndpoint::new),
    }
}

fn quota_monitor(mock_server: &MockServer, settings: &ProxySettings) -> ProxyUsageMonitor {
    let usage = format!("{}/account", mock_server.uri());
    let config = ProxyConfig::new(vec![
        provider("scraperapi", Some("k1"), Some(usage)),
        provider("scrapeops", Some("k2"), None),
    ]);
    ProxyUsageMonitor::new(config, settings).expect("Failed to build monitor")
}

fn usage_body(used: u64, limit: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(r#"{{"requestCount": {}, "requestLimit": {}}}"#, used, limit).into_bytes(),
        "application/json",
    )
}

#[tokio::test]
async fn test_quota_exhaustion_switches_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .and(query_param("api_key", "k1"))
        .respond_with(usage_body(1000, 1000))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut monitor = quota_monitor(&mock_server, &ProxySettings::default());

    assert_eq!(
        monitor.check_quota().await,
        QuotaDecision::Switch {
            from: "scraperapi".to_string(),
            to: "scrapeops".to_string()
        }
    );
    assert_eq!(monitor.selected(), Some("scrapeops"));

    let url = monitor.proxy_url("http://example.com/x").unwrap();
    assert!(url.starts_with("https://scrapeops.example.com/?url=http%3A%2F%2Fexample.com%2Fx&api_key=k2"));
}

#[tokio::test]
async fn test_quota_remaining_keeps_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(usage_body(10, 1000))
        .mount(&mock_server)
        .await;

    let mut monitor = quota_monitor(&mock_server, &ProxySettings::default());

    assert_eq!(monitor.check_quota().await, QuotaDecision::Keep);
    assert_eq!(monitor.selected(), Some("scraperapi"));
}

#[tokio::test]
async fn test_quota_server_error_keeps_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut monitor = quota_monitor(&mock_server, &ProxySettings::default());

    assert_eq!(monitor.check_quota().await, QuotaDecision::Unknown);
    assert_eq!(monitor.selected(), Some("scraperapi"));
}

#[tokio::test]
async fn test_quota_timeout_keeps_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(usage_body(1000, 1000).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let settings = ProxySettings {
        quota_timeout: 1,
        ..ProxySettings::default()
    };
    let mut monitor = quota_monitor(&mock_server, &settings);

    assert_eq!(monitor.check_quota().await, QuotaDecision::Unknown);
    assert_eq!(monitor.selected(), Some("scraperapi"));
}

#[tokio::test]
async fn test_quota_malformed_body_keeps_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"not json".to_vec(), "text/plain"))
        .mount(&mock_server)
        .await;

    let mut monitor = quota_monitor(&mock_server, &ProxySettings::default());
    assert_eq!(monitor.check_quota().await, QuotaDecision::Unknown);
}
