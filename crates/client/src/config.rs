//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `LOOMLINE_API_URL` - Storefront API origin (default: `http://127.0.0.1:3000`)
//! - `LOOMLINE_IDENTITY_STALE_SECS` - How long the current user is cached (default: 300)
//! - `LOOMLINE_STALE_SECS` - Freshness of every other cached response (default: 0)

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cache::CachePolicy;

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin; request paths start with `/api`.
    pub api_url: Url,
    pub identity_stale_time: Duration,
    pub default_stale_time: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let api_url = get("LOOMLINE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_url = Url::parse(api_url.trim())
            .map_err(|e| ConfigError::InvalidEnvVar("LOOMLINE_API_URL".to_owned(), e.to_string()))?;

        let seconds = |key: &str, default: u64| -> Result<Duration, ConfigError> {
            get(key).map_or(Ok(Duration::from_secs(default)), |v| {
                v.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
            })
        };

        Ok(Self {
            api_url,
            identity_stale_time: seconds("LOOMLINE_IDENTITY_STALE_SECS", 300)?,
            default_stale_time: seconds("LOOMLINE_STALE_SECS", 0)?,
        })
    }

    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::new(self.default_stale_time, self.identity_stale_time)
    }
}
