// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Unison Orchestrator CLI
//!
//! The `unison` binary hosts the orchestrator HTTP server and talks to a
//! running one.
//!
//! ## Commands
//!
//! - `unison serve` - Run the server in the foreground
//! - `unison config show|validate|generate` - Configuration management
//! - `unison skills list|register|invoke` - Skill registry
//! - `unison event send|confirm` - Submit events and redeem confirmations
//! - `unison policy check|reload` - Policy rules
//! - `unison status` - Readiness and introspection

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use unison_core::domain::orchestrator_config::OrchestratorConfigManifest;
use unison_orchestrator::commands::{
    self, ConfigCommand, EventCommand, PolicyCommand, SkillsCommand,
};
use unison_orchestrator::daemon::{self, OrchestratorClient, DEFAULT_PORT};

/// Unison orchestrator - policy-gated event intake and skill dispatch
#[derive(Parser)]
#[command(name = "unison")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "UNISON_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (server listen port, or the server to talk to)
    #[arg(long, global = true, env = "UNISON_PORT")]
    port: Option<u16>,

    /// Orchestrator host for client commands
    #[arg(long, global = true, env = "UNISON_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "UNISON_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator HTTP server in the foreground
    #[command(name = "serve")]
    Serve {
        /// Listen address (overrides spec.network.bind_address)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Skill registry operations
    #[command(name = "skills")]
    Skills {
        #[command(subcommand)]
        command: SkillsCommand,
    },

    /// Submit events and redeem confirmation tokens
    #[command(name = "event")]
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },

    /// Policy rule management
    #[command(name = "policy")]
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },

    /// Show readiness, skills and policy of a running server
    #[command(name = "status")]
    Status {
        /// Print the raw JSON report
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    if !matches!(command, Commands::Serve { .. }) {
        init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
    }

    let port = cli.port.unwrap_or(DEFAULT_PORT);
    let client = || OrchestratorClient::new(&cli.host, port);

    match command {
        Commands::Serve { bind } => serve(cli.config, cli.port, bind, cli.log_level).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Skills { command } => commands::skills::handle_command(command, &client()?).await,
        Commands::Event { command } => commands::event::handle_command(command, &client()?).await,
        Commands::Policy { command } => commands::policy::handle_command(command, &client()?).await,
        Commands::Status { json } => {
            commands::status::execute(&client()?, &cli.host, port, json).await
        }
    }
}

async fn serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
    log_level: Option<String>,
) -> Result<()> {
    let mut config = OrchestratorConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    if let Some(port) = port {
        config.spec.network.port = port;
    }
    if let Some(bind) = bind {
        config.spec.network.bind_address = bind;
    }

    let logging = &config.spec.observability.logging;
    init_logging(
        log_level.as_deref().unwrap_or(&logging.level),
        &logging.format,
    )?;

    info!("Starting Unison orchestrator v{}", env!("CARGO_PKG_VERSION"));
    daemon::run_server(config).await
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
