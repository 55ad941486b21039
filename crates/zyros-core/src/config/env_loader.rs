//! Environment variable overrides

use super::model::ClientConfig;
use crate::error::{ZyrosError, ZyrosResult};
use crate::transport::Lang;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_URL: &str = "ZYROS_API_URL";
pub const ENV_LANG: &str = "ZYROS_LANG";
pub const ENV_STALE_SECS: &str = "ZYROS_STALE_SECS";
pub const ENV_RETENTION_SECS: &str = "ZYROS_RETENTION_SECS";
pub const ENV_TOKEN_DIR: &str = "ZYROS_TOKEN_DIR";
pub const ENV_LOG_LEVEL: &str = "ZYROS_LOG_LEVEL";

/// Apply `ZYROS_*` variables from the process environment
///
/// Variables from a `.env` file in the working directory count as set.
pub fn apply_process_env(config: &mut ClientConfig) -> ZyrosResult<()> {
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }
    apply_env(config, |name| std::env::var(name).ok())
}

/// Apply `ZYROS_*` variables read through `lookup`
pub fn apply_env<F>(config: &mut ClientConfig, lookup: F) -> ZyrosResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = var(ENV_API_URL) {
        config.api_base_url = url.trim().to_string();
    }

    if let Some(lang) = var(ENV_LANG) {
        config.default_lang = lang
            .trim()
            .parse::<Lang>()
            .map_err(|_| ZyrosError::config(format!("Invalid {} value '{}'", ENV_LANG, lang)))?;
    }

    if let Some(secs) = var(ENV_STALE_SECS) {
        config.cache.stale_time = parse_secs(ENV_STALE_SECS, &secs)?;
    }

    if let Some(secs) = var(ENV_RETENTION_SECS) {
        config.cache.retention_time = parse_secs(ENV_RETENTION_SECS, &secs)?;
    }

    if let Some(dir) = var(ENV_TOKEN_DIR) {
        config.token_dir = Some(PathBuf::from(dir));
    }

    if let Some(level) = var(ENV_LOG_LEVEL) {
        config.logging.level = level.trim().to_ascii_lowercase();
    }

    Ok(())
}

fn parse_secs(name: &str, value: &str) -> ZyrosResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ZyrosError::config(format!("Invalid {} value '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> ZyrosResult<ClientConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = ClientConfig::default();
        apply_env(&mut config, |name| vars.get(name).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_env_overrides() {
        let config = apply(&[
            (ENV_API_URL, "https://zyros.example/api/v1"),
            (ENV_LANG, "en"),
            (ENV_STALE_SECS, "30"),
            (ENV_RETENTION_SECS, "90"),
            (ENV_TOKEN_DIR, "/tmp/zyros"),
            (ENV_LOG_LEVEL, "DEBUG"),
        ])
        .unwrap();

        assert_eq!(config.api_base_url, "https://zyros.example/api/v1");
        assert_eq!(config.default_lang, Lang::En);
        assert_eq!(config.cache.stale_time, Duration::from_secs(30));
        assert_eq!(config.cache.retention_time, Duration::from_secs(90));
        assert_eq!(config.token_dir, Some(PathBuf::from("/tmp/zyros")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = apply(&[(ENV_API_URL, ""), (ENV_LANG, "  ")]).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(apply(&[(ENV_LANG, "de")]).is_err());
        assert!(apply(&[(ENV_STALE_SECS, "five")]).is_err());
    }
}
