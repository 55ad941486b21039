//! Configuration management for the Zyros client

mod env_loader;
mod file_loader;
mod loader;
mod model;

pub use env_loader::{
    ENV_API_URL, ENV_LANG, ENV_LOG_LEVEL, ENV_RETENTION_SECS, ENV_STALE_SECS, ENV_TOKEN_DIR,
    apply_env,
};
pub use file_loader::load_from_file;
pub use loader::{ConfigLoader, ConfigSource, load_config};
pub use model::{ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_TOKEN_NAME, LoggingConfig};
