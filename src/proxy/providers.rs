use crate::config::ProxySettings;
use crate::proxy::ProxyError;
use url::Url;

/// A provider the crate knows how to talk to
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub base_url: &'static str,
    /// Environment variable holding the API key
    pub key_var: &'static str,
    pub usage_url: Option<&'static str>,
}

pub const BUILTIN_PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "scraperapi",
        base_url: "http://api.scraperapi.com/",
        key_var: "SCRAPER_API_KEY",
        usage_url: Some("http://api.scraperapi.com/account"),
    },
    ProviderSpec {
        name: "scrapeops",
        base_url: "https://proxy.scrapeops.io/v1/",
        key_var: "SCRAPEOPS_API_KEY",
        usage_url: None,
    },
];

/// Looks up a built-in provider by name
pub fn provider_spec(name: &str) -> Option<&'static ProviderSpec> {
    BUILTIN_PROVIDERS.iter().find(|p| p.name == name)
}

/// Where and how a provider reports its request quota
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEndpoint {
    pub url: String,
    /// JSON field holding the number of requests used
    pub used_field: String,
    /// JSON field holding the request limit
    pub limit_field: String,
}

impl UsageEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            used_field: "requestCount".to_string(),
            limit_field: "requestLimit".to_string(),
        }
    }
}

/// One configured provider
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Query parameters appended after `url` and `api_key`
    pub params: Vec<(String, String)>,
    pub usage: Option<UsageEndpoint>,
}

impl ProviderEntry {
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Provider table, in failover order with the initially selected provider first
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    providers: Vec<ProviderEntry>,
}

impl ProxyConfig {
    pub fn new(providers: Vec<ProviderEntry>) -> Self {
        Self { providers }
    }

    /// Loads provider keys from the process environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env(settings: &ProxySettings) -> Result<Self, ProxyError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(settings, |var| std::env::var(var).ok())
    }

    /// Builds the provider table, resolving API keys through `lookup`
    ///
    /// # Arguments
    ///
    /// * `settings` - Selected provider, failover order and country code
    /// * `lookup` - Maps an environment variable name to its value
    ///
    /// # Returns
    ///
    /// * `Ok(ProxyConfig)` - Every named provider is a built-in one
    /// * `Err(ProxyError)` - A provider name is not supported
    pub fn from_lookup<F>(settings: &ProxySettings, lookup: F) -> Result<Self, ProxyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut providers: Vec<ProviderEntry> = Vec::new();

        let order = std::iter::once(&settings.provider).chain(settings.failover.iter());
        for name in order {
            if providers.iter().any(|p| &p.name == name) {
                continue;
            }

            let spec = provider_spec(name).ok_or_else(|| {
                ProxyError::Configuration(format!("Unsupported proxy provider: {}", name))
            })?;

            providers.push(ProviderEntry {
                name: spec.name.to_string(),
                base_url: spec.base_url.to_string(),
                api_key: lookup(spec.key_var).filter(|key| !key.trim().is_empty()),
                params: vec![("country_code".to_string(), settings.country_code.clone())],
                usage: spec.usage_url.map(UsageEndpoint::new),
            });
        }

        Ok(Self { providers })
    }

    pub fn providers(&self) -> &[ProviderEntry] {
        &self.providers
    }

    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Builds the proxied URL for `target` through `provider`
    ///
    /// The result is `<base>?url=<target>&api_key=<key>` followed by the
    /// provider's default parameters, form-urlencoded. `target` is trimmed.
    pub fn build_proxy_url(&self, provider: &str, target: &str) -> Result<String, ProxyError> {
        let entry = self.get(provider).ok_or_else(|| {
            ProxyError::Configuration(format!("Unsupported proxy provider: {}", provider))
        })?;

        let api_key = match &entry.api_key {
            Some(key) if !key.is_empty() => key.as_str(),
            _ => {
                return Err(ProxyError::Configuration(format!(
                    "API key for {} is not configured.",
                    provider
                )))
            }
        };

        let params = [("url", target.trim()), ("api_key", api_key)]
            .into_iter()
            .chain(entry.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let url = Url::parse_with_params(&entry.base_url, params).map_err(|e| {
            ProxyError::Configuration(format!("Invalid base URL for {}: {}", provider, e))
        })?;

        Ok(url.to_string())
    }
}
