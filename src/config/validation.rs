use crate::config::types::{
    Config, CrawlerConfig, LoggingConfig, ProxySettings, SpiderConfig,
};
use crate::logstore::{same_file, LogClock};
use crate::proxy::provider_spec;
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_logging_config(&config.logging)?;
    validate_crawler_config(&config.crawler)?;
    validate_proxy_settings(&config.proxy)?;
    validate_spiders(&config.spiders)?;
    Ok(())
}

/// Validates log file configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if config.error_log.is_empty() {
        return Err(ConfigError::Validation(
            "error_log cannot be empty".to_string(),
        ));
    }

    if config.signal_log.is_empty() {
        return Err(ConfigError::Validation(
            "signal_log cannot be empty".to_string(),
        ));
    }

    if same_file(Path::new(&config.signal_log), Path::new(&config.error_log)) {
        return Err(ConfigError::Validation(format!(
            "signal_log and error_log must be different files, both are '{}'",
            config.error_log
        )));
    }

    if let Some(export) = config.json_export.as_deref().filter(|p| !p.is_empty()) {
        for (name, log) in [("error_log", &config.error_log), ("signal_log", &config.signal_log)] {
            if same_file(Path::new(export), Path::new(log)) {
                return Err(ConfigError::Validation(format!(
                    "json_export '{}' names the same file as {} '{}'",
                    export, name, log
                )));
            }
        }
    }

    LogClock::new(&config.timezone)?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout < 1 || config.connect_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got request={}s connect={}s",
            config.request_timeout, config.connect_timeout
        )));
    }

    if config.retry_times > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_times must be between 0 and 10, got {}",
            config.retry_times
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates proxy provider selection
fn validate_proxy_settings(config: &ProxySettings) -> Result<(), ConfigError> {
    for name in std::iter::once(&config.provider).chain(config.failover.iter()) {
        if provider_spec(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unsupported proxy provider '{}'",
                name
            )));
        }
    }

    if config.country_code.len() != 2 || !config.country_code.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(ConfigError::Validation(format!(
            "country_code must be a two-letter code, got '{}'",
            config.country_code
        )));
    }

    if config.quota_check_interval < 1 {
        return Err(ConfigError::Validation(
            "quota_check_interval must be >= 1".to_string(),
        ));
    }

    if config.quota_timeout < 1 || config.quota_timeout > 30 {
        return Err(ConfigError::Validation(format!(
            "quota_timeout must be between 1 and 30 seconds, got {}",
            config.quota_timeout
        )));
    }

    Ok(())
}

/// Validates spider definitions
fn validate_spiders(spiders: &[SpiderConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for spider in spiders {
        if spider.name.is_empty() {
            return Err(ConfigError::Validation(
                "spider name cannot be empty".to_string(),
            ));
        }

        if !names.insert(spider.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "spider '{}' is defined more than once",
                spider.name
            )));
        }

        for start_url in &spider.start_urls {
            let url = Url::parse(start_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "Start URL '{}' must use HTTP or HTTPS",
                    start_url
                )));
            }
        }

        validate_selector(&spider.item_selector)?;
        if let Some(selector) = &spider.next_selector {
            validate_selector(selector)?;
        }
        if let Some(selector) = &spider.disabled_selector {
            validate_selector(selector)?;
        }

        if spider.expect_pagination && spider.next_selector.is_none() {
            return Err(ConfigError::Validation(format!(
                "spider '{}' expects pagination but has no next_selector",
                spider.name
            )));
        }

        let mut fields = HashSet::new();
        for field in &spider.fields {
            if !fields.insert(field.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "spider '{}' defines field '{}' twice",
                    spider.name, field.name
                )));
            }
            validate_selector(&field.selector)?;
        }
    }

    Ok(())
}

/// Validates a CSS selector
pub(crate) fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}
