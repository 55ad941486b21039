//! Client configuration model

use crate::cache::CacheConfig;
use crate::error::{ZyrosError, ZyrosResult};
use crate::transport::Lang;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TOKEN_NAME: &str = "token";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Everything the client needs to talk to one API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root including the version prefix
    pub api_base_url: String,
    /// Storage name of the bearer token
    pub token_name: String,
    /// Directory for the file token storage; `~/.zyros/tokens` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_dir: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Language used when a command does not name one
    pub default_lang: Lang,
    /// Posts per listing page
    pub page_size: u32,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            token_dir: None,
            request_timeout: Duration::from_secs(30),
            default_lang: Lang::default(),
            page_size: 10,
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> ZyrosResult<()> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ZyrosError::config("api_base_url must not be empty"));
        }
        let url = url::Url::parse(base).map_err(|e| {
            ZyrosError::config_with_context(
                format!("Invalid api_base_url: {}", e),
                format!("api_base_url = '{}'", base),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ZyrosError::config(format!(
                "api_base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.token_name.trim().is_empty() {
            return Err(ZyrosError::config("token_name must not be empty"));
        }
        if self.page_size == 0 {
            return Err(ZyrosError::config("page_size must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(ZyrosError::config("request_timeout must be positive"));
        }

        if self.cache.retention_time < self.cache.stale_time {
            return Err(ZyrosError::config(format!(
                "cache.retention_time ({:?}) is shorter than cache.stale_time ({:?})",
                self.cache.retention_time, self.cache.stale_time
            )));
        }
        if self.cache.gc_interval.is_zero() {
            return Err(ZyrosError::config("cache.gc_interval must be positive"));
        }

        self.logging.validate()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ZyrosResult<()> {
        if LOG_LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(ZyrosError::config(format!(
                "Unknown log level '{}', expected one of {}",
                self.level,
                LOG_LEVELS.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.stale_time, Duration::from_secs(300));
        assert_eq!(config.cache.retention_time, Duration::from_secs(600));
        assert_eq!(config.default_lang, Lang::Fa);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig {
            api_base_url: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.api_base_url = "ftp://example.com".into();
        assert!(config.validate().is_err());

        config.api_base_url = DEFAULT_API_BASE_URL.into();
        config.cache.retention_time = Duration::from_secs(60);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retention_time"));

        config.cache = CacheConfig::default();
        config.logging.level = "verbose".into();
        assert!(config.validate().is_err());
    }
}
