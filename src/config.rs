use crate::core::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Geocoding service client and retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff_ms: u64,
    #[serde(default = "default_timeout_backoff")]
    pub timeout_backoff_ms: u64,
    #[serde(default = "default_unavailable_backoff")]
    pub unavailable_backoff_ms: u64,
    /// Unset keeps retrying for as long as the service rate limits
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout(),
            max_attempts: default_max_attempts(),
            request_interval_ms: default_request_interval(),
            rate_limit_backoff_ms: default_rate_limit_backoff(),
            timeout_backoff_ms: default_timeout_backoff(),
            unavailable_backoff_ms: default_unavailable_backoff(),
            max_rate_limit_retries: None,
        }
    }
}

impl GeocoderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            request_interval: Duration::from_millis(self.request_interval_ms),
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
            timeout_backoff: Duration::from_millis(self.timeout_backoff_ms),
            unavailable_backoff: Duration::from_millis(self.unavailable_backoff_ms),
            max_rate_limit_retries: self.max_rate_limit_retries,
        }
    }
}

fn default_geocoder_url() -> String { crate::services::nominatim::DEFAULT_BASE_URL.to_string() }
fn default_user_agent() -> String { crate::services::nominatim::DEFAULT_USER_AGENT.to_string() }
fn default_geocoder_timeout() -> u64 { 10 }
fn default_max_attempts() -> u32 { 3 }
fn default_request_interval() -> u64 { 1100 }
fn default_rate_limit_backoff() -> u64 { 5000 }
fn default_timeout_backoff() -> u64 { 2000 }
fn default_unavailable_backoff() -> u64 { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self { max_results: default_max_results() }
    }
}

fn default_max_results() -> usize { crate::core::DEFAULT_MAX_RESULTS }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: default_cache_ttl() }
    }
}

fn default_cache_ttl() -> u64 { 300 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with INTAKE_)
    /// 5. DATABASE_URL, if set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., INTAKE__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        with_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        with_database_url(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("INTAKE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional `DATABASE_URL` variable on top of loaded settings
fn with_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
