//! Printwatch
//!
//! Polls the filament watcher's status endpoint and mirrors the live
//! feed-rate series into the configured renderer. Runs until killed.

use anyhow::Context;
use clap::Parser;
use printwatch::config::{generate_default_config, Config, LoggingConfig};
use printwatch::poller::Poller;
use printwatch::reconcile::Reconciler;
use printwatch::render::LogRenderer;
use printwatch::source::HttpSource;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "printwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live status poller for the filament watcher")]
struct Cli {
    /// Status endpoint URL (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Poll interval in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a default configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.url {
        config.endpoint.url = url;
    }
    if let Some(interval) = cli.interval_ms {
        config.poller.interval_ms = interval;
    }

    init_tracing(&config.logging);

    tracing::info!("Printwatch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Polling {}", config.endpoint.url);

    let poller = Poller::new(
        Box::new(HttpSource::new(config.source_config())),
        Box::new(LogRenderer::new()),
        Reconciler::new(config.reconciler_config()),
        config.poller_config(),
    );

    poller.run().await;
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("printwatch={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
