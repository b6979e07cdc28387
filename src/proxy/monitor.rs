use crate::config::ProxySettings;
use crate::proxy::{ProviderEntry, ProxyConfig, ProxyError, UsageEndpoint};
use std::time::Duration;

/// Outcome of one quota check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Quota remains on the selected provider
    Keep,

    /// The selected provider is exhausted and the next one was selected
    Switch { from: String, to: String },

    /// The selected provider is exhausted and no other provider has a key
    Exhausted { provider: String },

    /// Usage could not be determined; the selection is unchanged
    Unknown,
}

/// Tracks the selected proxy provider and polls its quota
pub struct ProxyUsageMonitor {
    config: ProxyConfig,
    selected: usize,
    client: reqwest::Client,
    check_interval: u32,
    since_check: u32,
}

impl ProxyUsageMonitor {
    /// Creates a monitor with the first provider that has an API key selected
    ///
    /// Falls back to the first provider when none has a key. The quota query
    /// uses its own client with `settings.quota_timeout`.
    pub fn new(config: ProxyConfig, settings: &ProxySettings) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.quota_timeout))
            .build()?;

        let selected = config
            .providers()
            .iter()
            .position(ProviderEntry::has_key)
            .unwrap_or(0);

        Ok(Self {
            config,
            selected,
            client,
            check_interval: settings.quota_check_interval.max(1),
            since_check: 0,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Name of the selected provider
    pub fn selected(&self) -> Option<&str> {
        self.current().map(|p| p.name.as_str())
    }

    fn current(&self) -> Option<&ProviderEntry> {
        self.config.providers().get(self.selected)
    }

    /// Builds the proxied URL through the selected provider
    ///
    /// Returns `None` when the provider cannot be used, so the caller can
    /// fall back to a direct request.
    pub fn proxy_url(&self, target: &str) -> Option<String> {
        let provider = self.selected()?;
        match self.config.build_proxy_url(provider, target) {
            Ok(url) => {
                tracing::debug!("Generated {} proxy URL for {}", provider, target.trim());
                Some(url)
            }
            Err(e) => {
                tracing::error!("Error generating proxy URL for {}: {}", provider, e);
                None
            }
        }
    }

    /// Counts one issued request and checks the quota every `quota-check-interval` requests
    ///
    /// # Returns
    ///
    /// * `Some(QuotaDecision)` - A check was due and ran
    /// * `None` - No check was due
    pub async fn tick(&mut self) -> Option<QuotaDecision> {
        self.since_check += 1;
        if self.since_check < self.check_interval {
            return None;
        }
        self.since_check = 0;
        Some(self.check_quota().await)
    }

    /// Queries the selected provider's usage endpoint
    ///
    /// Failures, timeouts and providers without a usage endpoint keep the
    /// current selection.
    pub async fn check_quota(&mut self) -> QuotaDecision {
        let Some(entry) = self.current() else {
            return QuotaDecision::Unknown;
        };
        let (Some(usage), Some(api_key)) = (entry.usage.clone(), entry.api_key.clone()) else {
            return QuotaDecision::Unknown;
        };
        let provider = entry.name.clone();

        match self.query_usage(&usage, &api_key).await {
            Ok((used, limit)) if used >= limit => {
                tracing::warn!(
                    "{} quota exhausted ({}/{} requests)",
                    provider,
                    used,
                    limit
                );
                self.switch_provider()
            }
            Ok((used, limit)) => {
                tracing::debug!("{} quota: {}/{} requests", provider, used, limit);
                QuotaDecision::Keep
            }
            Err(e) => {
                tracing::warn!("Could not check {} quota: {}", provider, e);
                QuotaDecision::Unknown
            }
        }
    }

    /// Selects the next provider in failover order that has an API key
    pub fn switch_provider(&mut self) -> QuotaDecision {
        let from = match self.selected() {
            Some(name) => name.to_string(),
            None => return QuotaDecision::Unknown,
        };

        let next = self
            .config
            .providers()
            .iter()
            .enumerate()
            .skip(self.selected + 1)
            .find(|(_, p)| p.has_key())
            .map(|(idx, _)| idx);

        match next {
            Some(idx) => {
                self.selected = idx;
                let to = self.config.providers()[idx].name.clone();
                tracing::info!("Switching proxy provider from {} to {}", from, to);
                QuotaDecision::Switch { from, to }
            }
            None => {
                tracing::error!("No proxy provider left after {}", from);
                QuotaDecision::Exhausted { provider: from }
            }
        }
    }

    async fn query_usage(
        &self,
        usage: &UsageEndpoint,
        api_key: &str,
    ) -> Result<(u64, u64), ProxyError> {
        let body = self
            .client
            .get(&usage.url)
            .query(&[("api_key", api_key)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ProxyError::QuotaQuery(e.to_string()))?;

        let field = |name: &str| {
            json.get(name).and_then(|v| v.as_u64()).ok_or_else(|| {
                ProxyError::QuotaQuery(format!("missing numeric field '{}'", name))
            })
        };

        Ok((field(&usage.used_field)?, field(&usage.limit_field)?))
    }
}
