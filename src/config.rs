use config::{Config, ConfigError, Environment, File};
use log::debug;
use serde::Deserialize;
use std::env;

pub const DEFAULT_PRIMARY_HOST: &str = "spoonacular-recipe-food-nutrition-v1.p.rapidapi.com";
pub const DEFAULT_FALLBACK_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// Top-level gateway configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Primary (RapidAPI Spoonacular) provider settings
    #[serde(default)]
    pub primary: PrimaryConfig,
    /// Secondary (TheMealDB) provider settings
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Per upstream call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Whole request deadline in seconds
    #[serde(default = "default_deadline")]
    pub deadline: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            primary: PrimaryConfig::default(),
            fallback: FallbackConfig::default(),
            cache: CacheConfig::default(),
            timeout: default_timeout(),
            deadline: default_deadline(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Configuration for the primary provider
#[derive(Debug, Deserialize, Clone)]
pub struct PrimaryConfig {
    /// RapidAPI key. Without it every request goes straight to the fallback provider.
    pub api_key: Option<String>,
    /// Value of the `x-rapidapi-host` header
    #[serde(default = "default_primary_host")]
    pub host: String,
    /// Base URL override (for proxies and tests); defaults to `https://{host}`
    pub base_url: Option<String>,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            host: default_primary_host(),
            base_url: None,
        }
    }
}

impl PrimaryConfig {
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.host))
    }
}

/// Configuration for the secondary provider
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_base_url")]
    pub base_url: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: default_fallback_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Lifetime of a cached primary response in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_primary_host() -> String {
    DEFAULT_PRIMARY_HOST.to_string()
}

fn default_fallback_base_url() -> String {
    DEFAULT_FALLBACK_BASE_URL.to_string()
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_timeout() -> u64 {
    10
}

fn default_deadline() -> u64 {
    25
}

impl GatewayConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. `RAPIDAPI_KEY`, `RAPIDAPI_RECIPES_HOST` / `RAPIDAPI_HOST`
    /// 2. Environment variables with CLEAN_KITCHEN__ prefix
    /// 3. config.toml file in current directory
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// Overlay the legacy RapidAPI variables
    fn apply_rapidapi_env(&mut self, key: Option<String>, host: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            debug!("Using primary API key from RAPIDAPI_KEY");
            self.primary.api_key = Some(key);
        }
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.primary.host = host;
        }
    }
}

/// Load configuration from file and environment variables
///
/// Environment variable format: CLEAN_KITCHEN__PRIMARY__API_KEY
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("CLEAN_KITCHEN")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: GatewayConfig = settings.try_deserialize()?;
    config.apply_rapidapi_env(
        env::var("RAPIDAPI_KEY").ok(),
        env::var("RAPIDAPI_RECIPES_HOST")
            .or_else(|_| env::var("RAPIDAPI_HOST"))
            .ok(),
    );
    Ok(config)
}
