//! Main entry point for the Zanata CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zanata_client::cli::commands::{self, Commands, OutputFormat};
use zanata_client::{ClientConfig, Session};

/// Zanata Client - browse projects, suggestions and translated documentation
#[derive(Parser, Debug)]
#[command(name = "zanata", version, about, long_about = None)]
struct Args {
    /// Credential store (defaults to ZANATA_CONFIG or ~/.config/zanata.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server domain as named in the credential store
    #[arg(long)]
    domain: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("zanata_client={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Override config with CLI args if provided
    let mut config = ClientConfig::from_env()?;
    if let Some(path) = args.config {
        config = config.with_credentials_path(path);
    }
    if let Some(domain) = args.domain {
        config = config.with_domain(domain);
    }
    debug!(?config, "resolved configuration");

    let session = Session::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            on_interrupt.cancel();
        }
    });

    commands::run(&session, args.command, args.format, &cancel).await
}
