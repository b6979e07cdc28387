//! Crawl-Sentinel: error classification and structured logging for crawl jobs
//!
//! This crate intercepts lifecycle events and failures from a small crawl engine,
//! normalizes them into a stable `(category, subcategory, code)` taxonomy,
//! persists them durably and feeds a proxy failover decision.

pub mod classify;
pub mod config;
pub mod crawler;
pub mod logstore;
pub mod output;
pub mod proxy;
pub mod signals;
pub mod state;

use thiserror::Error;

/// Main error type for Crawl-Sentinel operations
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Log store error: {0}")]
    Store(#[from] logstore::StoreError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] proxy::ProxyError),

    #[error("Signal error: {0}")]
    Signal(#[from] signals::SignalError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Spider not found: {0}")]
    SpiderNotFound(String),

    #[error("Invalid run state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}

/// Result type alias for Crawl-Sentinel operations
pub type Result<T> = std::result::Result<T, SentinelError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use classify::{classify, Classification, ErrorCategory, ErrorCode, FailureContext};
pub use config::Config;
pub use logstore::{ErrorEntry, ErrorReporter, ErrorSink, LogStore};
pub use state::{CloseReason, RunState};
