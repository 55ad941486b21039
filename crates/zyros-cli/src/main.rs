//! Zyros command-line client
//!
//! Drives the client core against a live API:
//!
//! ```bash
//! zyros login sara
//! zyros feed --lang fa --type article
//! zyros like 42
//! zyros post "Title" "Some content worth reading" --image cat.png
//! ```
//!
//! Set `RUST_LOG=debug` to see cache hits, misses and session transitions.

mod args;
mod commands;
mod console;
mod router;

use args::Cli;
use clap::Parser;
use console::CliConsole;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zyros_core::config::LoggingConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match zyros_core::load_config(cli.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            CliConsole::new(false).error(&e.display_message());
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging, cli.verbose, cli.json_logs);

    match router::route(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            CliConsole::new(false).report(&e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(logging: &LoggingConfig, verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json || logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
