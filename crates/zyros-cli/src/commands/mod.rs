//! CLI commands

pub mod config;
pub mod posts;
pub mod profile;
pub mod route;
pub mod session;

use crate::console::CliConsole;
use serde::Serialize;
use zyros_core::{ZyrosClient, ZyrosError, ZyrosResult};

/// Everything a command needs
pub struct Context {
    pub client: ZyrosClient,
    pub console: CliConsole,
    pub json: bool,
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> ZyrosResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ZyrosError::json(format!("Failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}
