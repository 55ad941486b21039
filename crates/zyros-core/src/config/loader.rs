//! Configuration loader
//!
//! Sources are applied in the order they were added: a file replaces what
//! came before it, the environment overrides single fields.

use super::env_loader::{apply_env, apply_process_env};
use super::file_loader::load_from_file;
use super::model::ClientConfig;
use crate::error::ZyrosResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Configuration from a file
    File(PathBuf),
    /// `ZYROS_*` variables, `.env` included
    Environment,
    /// Fixed variables, for tests and embedding
    Variables(HashMap<String, String>),
    /// Default configuration
    Default,
}

/// Configuration loader with support for multiple sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add environment variables source
    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    /// Add fixed variables, read like the environment
    pub fn with_vars(self, vars: HashMap<String, String>) -> Self {
        self.add_source(ConfigSource::Variables(vars))
    }

    /// Add default configuration source
    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Load configuration from all sources and validate it
    pub fn load(self) -> ZyrosResult<ClientConfig> {
        let mut config = ClientConfig::default();

        for source in &self.sources {
            match source {
                ConfigSource::Default => config = ClientConfig::default(),
                ConfigSource::File(path) => {
                    if let Some(file_config) = load_from_file(path)? {
                        tracing::debug!(path = %path.display(), "loaded config file");
                        config = file_config;
                    }
                }
                ConfigSource::Environment => apply_process_env(&mut config)?,
                ConfigSource::Variables(vars) => {
                    apply_env(&mut config, |name| vars.get(name).cloned())?
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Defaults, then `path` or the default files, then the environment
///
/// Default files are `zyros.toml` in the working directory and
/// `~/.zyros/config.toml`, the first one found wins.
pub fn load_config(path: Option<&Path>) -> ZyrosResult<ClientConfig> {
    let mut loader = ConfigLoader::new().with_defaults();

    match path {
        Some(path) => loader = loader.with_file(path),
        None => {
            let candidates = std::iter::once(PathBuf::from("zyros.toml"))
                .chain(dirs::home_dir().map(|home| home.join(".zyros").join("config.toml")));
            if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
                loader = loader.with_file(found);
            }
        }
    }

    loader.with_env().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zyros.toml");
        std::fs::write(
            &path,
            "api_base_url = \"https://file.example/api/v1\"\npage_size = 20\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_defaults()
            .with_file(&path)
            .with_vars(HashMap::from([(
                "ZYROS_API_URL".to_string(),
                "https://env.example/api/v1".to_string(),
            )]))
            .load()
            .unwrap();

        assert_eq!(config.api_base_url, "https://env.example/api/v1");
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_load_validates() {
        let err = ConfigLoader::new()
            .with_defaults()
            .with_vars(HashMap::from([
                ("ZYROS_STALE_SECS".to_string(), "600".to_string()),
                ("ZYROS_RETENTION_SECS".to_string(), "60".to_string()),
            ]))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("retention_time"));
    }

    #[test]
    fn test_defaults_only() {
        let config = ConfigLoader::new().with_defaults().load().unwrap();
        assert_eq!(config.cache.gc_interval, Duration::from_secs(60));
    }
}
