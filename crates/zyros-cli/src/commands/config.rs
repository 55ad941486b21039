//! Configuration commands

use super::print_json;
use crate::console::CliConsole;
use colored::*;
use zyros_core::{ClientConfig, ZyrosResult};

/// Show the effective configuration
pub fn show(console: &CliConsole, config: &ClientConfig, json: bool) -> ZyrosResult<()> {
    if json {
        return print_json(config);
    }

    console.print_header("Configuration");
    let token_dir = config
        .token_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "~/.zyros/tokens".to_string());

    let rows = [
        ("API", config.api_base_url.clone()),
        ("Token", format!("{} in {}", config.token_name, token_dir)),
        ("Language", config.default_lang.to_string()),
        ("Page size", config.page_size.to_string()),
        (
            "Request timeout",
            format!("{}s", config.request_timeout.as_secs()),
        ),
        (
            "Stale after",
            format!("{}s", config.cache.stale_time.as_secs()),
        ),
        (
            "Evicted after",
            format!("{}s", config.cache.retention_time.as_secs()),
        ),
        ("Log level", config.logging.level.clone()),
    ];
    for (name, value) in rows {
        println!("{:<16} {}", format!("{name}:").bold(), value);
    }
    Ok(())
}

/// The configuration was validated while loading; confirm it
pub fn validate(console: &CliConsole, config: &ClientConfig) -> ZyrosResult<()> {
    config.validate()?;
    console.success("Configuration is valid");
    Ok(())
}
