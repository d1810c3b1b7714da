// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Fleet Server
//!
//! The `fleet-server` binary serves the agent-facing ack API.
//!
//! ## Commands
//!
//! - `fleet-server` / `fleet-server serve` - Run the HTTP API until SIGINT/SIGTERM
//! - `fleet-server config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod commands;
mod server;

use commands::ConfigCommand;
use fleet_core::domain::config::{FleetServerConfig, LoggingConfig};

/// Fleet Server - agent acknowledgments and policy reconciliation
#[derive(Parser)]
#[command(name = "fleet-server")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "FLEET_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (overrides spec.network.port)
    #[arg(long, global = true, env = "FLEET_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FLEET_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::Config { command }) = cli.command {
        return commands::config::handle_command(command, cli.config).await;
    }

    let mut config = FleetServerConfig::discover(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.spec.network.port = port;
    }
    if let Some(level) = cli.log_level {
        config.spec.observability.logging.level = level;
    }
    config.validate().context("Configuration validation failed")?;

    // Initialize logging
    init_logging(&config.spec.observability.logging)?;

    info!(name = %config.metadata.name, "Starting fleet server");
    server::run(config).await
}

/// Initialize tracing subscriber for logging
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&logging.level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
