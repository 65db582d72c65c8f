use std::sync::Arc;
use std::time::Duration;

use log::info;
use reqwest::Client;
use url::Url;

use crate::cache::{CacheStore, MemoryCache, DEFAULT_TTL};
use crate::config::{GatewayConfig, DEFAULT_FALLBACK_BASE_URL, DEFAULT_PRIMARY_HOST};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::providers::{MealDbProvider, RecipeProvider, SpoonacularProvider};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DEADLINE: Duration = Duration::from_secs(25);

/// Builder for configuring a [`Gateway`]
#[derive(Default)]
pub struct GatewayBuilder {
    api_key: Option<String>,
    host: Option<String>,
    primary_base_url: Option<String>,
    fallback_base_url: Option<String>,
    cache: Option<Arc<dyn CacheStore>>,
    cache_ttl: Option<Duration>,
    timeout: Option<Duration>,
    deadline: Option<Duration>,
}

impl GatewayBuilder {
    /// Pre-fill every setting from a loaded configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        GatewayBuilder {
            api_key: config.primary.api_key.clone(),
            host: Some(config.primary.host.clone()),
            primary_base_url: Some(config.primary.resolved_base_url()),
            fallback_base_url: Some(config.fallback.base_url.clone()),
            cache: None,
            cache_ttl: Some(Duration::from_secs(config.cache.ttl_secs)),
            timeout: Some(Duration::from_secs(config.timeout)),
            deadline: Some(Duration::from_secs(config.deadline)),
        }
    }

    /// Set the RapidAPI key. A blank key disables the primary provider.
    ///
    /// # Example
    /// ```
    /// use clean_kitchen_gateway::Gateway;
    ///
    /// let builder = Gateway::builder().api_key("your-rapidapi-key");
    /// ```
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the `x-rapidapi-host` header value
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Override the primary provider's base URL (defaults to `https://{host}`)
    pub fn primary_base_url(mut self, url: impl Into<String>) -> Self {
        self.primary_base_url = Some(url.into());
        self
    }

    /// Override the fallback provider's base URL
    pub fn fallback_base_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_base_url = Some(url.into());
        self
    }

    /// Share a cache store instead of creating a fresh in-memory one
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Set the timeout of each upstream HTTP call
    ///
    /// # Example
    /// ```
    /// use clean_kitchen_gateway::Gateway;
    /// use std::time::Duration;
    ///
    /// let builder = Gateway::builder().timeout(Duration::from_secs(5));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the overall deadline of one gateway request
    pub fn deadline(mut self, duration: Duration) -> Self {
        self.deadline = Some(duration);
        self
    }

    /// Build the gateway
    ///
    /// # Errors
    /// Returns `GatewayError` if a base URL does not parse or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(concat!("clean-kitchen-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let host = self
            .host
            .unwrap_or_else(|| DEFAULT_PRIMARY_HOST.to_string());

        let primary = match self.api_key.filter(|k| !k.trim().is_empty()) {
            Some(api_key) => {
                let base_url = match self.primary_base_url {
                    Some(url) => Url::parse(&url)?,
                    None => Url::parse(&format!("https://{}", host))?,
                };
                info!("Primary provider enabled at {}", base_url);
                let provider = SpoonacularProvider::new(
                    client.clone(),
                    base_url,
                    api_key,
                    host,
                    self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
                    self.cache_ttl.unwrap_or(DEFAULT_TTL),
                );
                Some(Arc::new(provider) as Arc<dyn RecipeProvider>)
            }
            None => {
                info!("No primary API key configured; serving from fallback provider only");
                None
            }
        };

        let fallback_url = Url::parse(
            self.fallback_base_url
                .as_deref()
                .unwrap_or(DEFAULT_FALLBACK_BASE_URL),
        )?;
        let fallback = Arc::new(MealDbProvider::new(client, fallback_url));

        Ok(Gateway::new(
            primary,
            fallback,
            self.deadline.unwrap_or(DEFAULT_DEADLINE),
        ))
    }
}
