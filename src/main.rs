// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! confab - provider-agnostic LLM conversations from your terminal
//!
//! Entry point for the confab CLI application.

use clap::Parser;

use confab::cli::{Cli, Commands};
use confab::config::Settings;
use confab::error::Result;

#[path = "main/cli_commands.rs"]
mod cli_commands;

use cli_commands::run_ask;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on session and transport diagnostics. `RUST_LOG` still applies.
    let crate_level = match cli.verbose {
        0 => None,
        1 => Some("confab=debug"),
        _ => Some("confab=trace"),
    };
    if let Some(directive) = crate_level {
        if let Ok(parsed) = directive.parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    // Load settings
    let settings = match cli.config {
        Some(ref path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Ask(args) => run_ask(args, settings).await,
    }
}
