//! Deskhand CLI — the main entry point.
//!
//! Commands:
//! - `init`  — Write a starter config file
//! - `serve` — Start the HTTP gateway

use anyhow::Context;
use clap::{Parser, Subcommand};
use deskhand_config::AppConfig;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "deskhand",
    about = "Deskhand — AI workforce backend for small businesses",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "deskhand.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { force } => init(&cli.config, force),
        Commands::Serve { port } => serve(&cli.config, port).await,
    }
}

fn init(path: &str, force: bool) -> anyhow::Result<()> {
    if std::path::Path::new(path).exists() && !force {
        anyhow::bail!("{path} already exists (use --force to overwrite)");
    }
    std::fs::write(path, AppConfig::default_toml())
        .with_context(|| format!("Failed to write {path}"))?;
    info!(path, "Wrote starter config");
    println!("Wrote {path} — edit it, then run `deskhand serve`.");
    Ok(())
}

async fn serve(path: &str, port: Option<u16>) -> anyhow::Result<()> {
    let mut config =
        AppConfig::load_or_default(path).with_context(|| format!("Failed to load {path}"))?;
    if let Some(port) = port {
        config.gateway.port = port;
    }

    deskhand_gateway::serve(config)
        .await
        .map_err(|e| anyhow::anyhow!("Gateway failed: {e}"))
}
