//! Proxy provider URLs and quota-driven failover
//!
//! Provider credentials are read once from the environment (a `.env` file is
//! honored) into an immutable `ProxyConfig`. The `ProxyUsageMonitor` only ever
//! changes which provider is selected.

mod monitor;
mod providers;

pub use monitor::{ProxyUsageMonitor, QuotaDecision};
pub use providers::{
    provider_spec, ProviderEntry, ProviderSpec, ProxyConfig, UsageEndpoint, BUILTIN_PROVIDERS,
};

use thiserror::Error;

/// Errors raised while building proxy URLs or querying provider quotas
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Configuration(String),

    #[error("Quota query failed: {0}")]
    QuotaQuery(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
