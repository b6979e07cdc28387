//! Configuration module for Crawl-Sentinel
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; an empty file yields the built-in defaults.
//! Proxy API keys are never read from this file, they come from the environment.
//!
//! # Example
//!
//! ```no_run
//! use crawl_sentinel::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sentinel.toml")).unwrap();
//! println!("Signals are logged to: {}", config.logging.signal_log);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FieldConfig, LogFormat, LoggingConfig, ProxySettings, SpiderConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
