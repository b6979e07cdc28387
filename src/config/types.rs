use serde::Deserialize;

/// Main configuration structure for Crawl-Sentinel
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub proxy: ProxySettings,
    #[serde(default = "default_spiders", rename = "spider")]
    pub spiders: Vec<SpiderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            crawler: CrawlerConfig::default(),
            proxy: ProxySettings::default(),
            spiders: default_spiders(),
        }
    }
}

impl Config {
    /// Looks up a spider definition by name
    pub fn spider(&self, name: &str) -> Option<&SpiderConfig> {
        self.spiders.iter().find(|s| s.name == name)
    }
}

/// Error log backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Whole log is one JSON array, rewritten on every append
    JsonArray,
    /// Newline-delimited records, append-only
    Journal,
}

/// Log file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Path to the error log
    #[serde(default = "default_error_log")]
    pub error_log: String,

    /// Error log backend
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Path to the line-oriented signal log
    #[serde(default = "default_signal_log")]
    pub signal_log: String,

    /// IANA timezone used for every timestamp
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Where the JSON array view is written when a spider closes
    #[serde(default = "default_json_export")]
    pub json_export: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            error_log: default_error_log(),
            format: default_log_format(),
            signal_log: default_signal_log(),
            timezone: default_timezone(),
            json_export: default_json_export(),
        }
    }
}

/// Crawl engine behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Connection timeout (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Extra attempts for requests that failed without a response
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,

    /// Maximum number of requests issued per run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Route requests through the selected proxy provider
    #[serde(default)]
    pub use_proxy: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            retry_times: default_retry_times(),
            max_pages: default_max_pages(),
            use_proxy: false,
        }
    }
}

/// Proxy provider selection; credentials come from the environment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxySettings {
    /// Provider selected at startup
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Failover order, tried after the selected provider
    #[serde(default = "default_provider_order")]
    pub failover: Vec<String>,

    /// Target country passed to the provider
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Number of requests between two quota checks
    #[serde(default = "default_quota_check_interval")]
    pub quota_check_interval: u32,

    /// Timeout for the quota query (seconds)
    #[serde(default = "default_quota_timeout")]
    pub quota_timeout: u64,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            failover: default_provider_order(),
            country_code: default_country_code(),
            quota_check_interval: default_quota_check_interval(),
            quota_timeout: default_quota_timeout(),
        }
    }
}

/// A listing spider driven entirely by CSS selectors
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpiderConfig {
    pub name: String,

    #[serde(default)]
    pub start_urls: Vec<String>,

    /// Selector matching one item card on a listing page
    pub item_selector: String,

    #[serde(default, rename = "field")]
    pub fields: Vec<FieldConfig>,

    /// Selector for the "next page" control
    #[serde(default)]
    pub next_selector: Option<String>,

    /// Selector marking the next control as disabled (end of results)
    #[serde(default)]
    pub disabled_selector: Option<String>,

    /// Whether every page is expected to carry a next control
    #[serde(default)]
    pub expect_pagination: bool,
}

/// One extracted item field
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldConfig {
    pub name: String,

    /// Selector relative to the item card
    pub selector: String,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attr: Option<String>,

    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_error_log() -> String {
    "logs/errors.jsonl".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Journal
}

fn default_signal_log() -> String {
    "logs/signals.log".to_string()
}

fn default_timezone() -> String {
    crate::logstore::DEFAULT_TIMEZONE.to_string()
}

fn default_json_export() -> Option<String> {
    Some("logs/errors.json".to_string())
}

fn default_user_agent() -> String {
    format!("crawl-sentinel/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retry_times() -> u32 {
    2
}

fn default_max_pages() -> u32 {
    100
}

fn default_provider() -> String {
    "scraperapi".to_string()
}

fn default_provider_order() -> Vec<String> {
    vec!["scraperapi".to_string(), "scrapeops".to_string()]
}

fn default_country_code() -> String {
    "US".to_string()
}

fn default_quota_check_interval() -> u32 {
    25
}

fn default_quota_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// The product listing spider shipped with the crate
fn default_spiders() -> Vec<SpiderConfig> {
    let field = |name: &str, selector: &str| FieldConfig {
        name: name.to_string(),
        selector: selector.to_string(),
        attr: None,
        required: true,
    };

    vec![SpiderConfig {
        name: "error".to_string(),
        start_urls: vec!["https://httpbin.org/status/200".to_string()],
        item_selector: ".puis-card-border".to_string(),
        fields: vec![
            field("name", ".a-color-base.a-text-normal > span"),
            field("price", ".a-price-whole"),
            field("stars", ".a-icon-star-small .a-icon-alt"),
        ],
        next_selector: Some(".s-pagination-next".to_string()),
        disabled_selector: Some(".s-pagination-disabled".to_string()),
        expect_pagination: false,
    }]
}
