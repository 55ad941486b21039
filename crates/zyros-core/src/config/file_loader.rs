//! File-based configuration loading

use super::model::ClientConfig;
use crate::error::{ZyrosError, ZyrosResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// TOML for `.toml` files, JSON otherwise. Fields the file leaves out keep
/// their defaults. Returns `None` if the file doesn't exist.
pub fn load_from_file(path: &Path) -> ZyrosResult<Option<ClientConfig>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, skipping");
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ZyrosError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            ZyrosError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            ZyrosError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(Some(config))
}
