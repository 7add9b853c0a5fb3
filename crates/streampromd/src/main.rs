//! streampromd — the streamprom daemon.
//!
//! Single binary that assembles the exporter:
//! - Stream consumer (line source on stdin or a file)
//! - Metrics engine
//! - Optional expiry sweeper
//! - HTTP scrape endpoint
//!
//! # Usage
//!
//! ```text
//! streampromd init --metric-type counter > streamprom.toml
//! streampromd run --config streamprom.toml --port 7979
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use streamprom_core::{ExporterConfig, MetricType};
use streamprom_metrics::MetricsEngine;
use streamprom_source::{LineSource, TopicFilter, run_consumer};

#[derive(Parser)]
#[command(name = "streampromd", about = "Stream-to-Prometheus metrics exporter", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consume records and serve them for scraping.
    Run {
        /// Path to the exporter config file.
        #[arg(short, long, default_value = "streamprom.toml")]
        config: PathBuf,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Input file, or `-` for stdin (overrides the config file).
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print a scaffold config file.
    Init {
        /// Combination policy: gauge or counter.
        #[arg(long, default_value = "counter")]
        metric_type: MetricType,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,streampromd=debug,streamprom=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            port,
            input,
        } => run(&config, port, input).await,
        Command::Init { metric_type } => {
            print!("{}", ExporterConfig::scaffold(metric_type).to_toml_string()?);
            Ok(())
        }
    }
}

async fn run(config_path: &Path, port: Option<u16>, input: Option<PathBuf>) -> anyhow::Result<()> {
    let config = ExporterConfig::from_file(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(path = %config_path.display(), "config loaded");

    // ── Initialize subsystems ──────────────────────────────────

    let engine = Arc::new(MetricsEngine::from_config(&config.exporter)?);
    let filter = TopicFilter::from_settings(&config.source)?;
    let input = input
        .or_else(|| config.source.input.clone())
        .unwrap_or_else(|| PathBuf::from("-"));
    let default_topic = config.source.default_topic.clone();

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let consumer_handle = {
        let engine = engine.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let result = if input == Path::new("-") {
                info!("consuming from stdin");
                run_consumer(LineSource::stdin(default_topic), &engine, &filter, shutdown).await
            } else {
                info!(path = %input.display(), "consuming from file");
                match LineSource::open(&input, default_topic).await {
                    Ok(source) => run_consumer(source, &engine, &filter, shutdown).await,
                    Err(e) => Err(e),
                }
            };
            if let Err(e) = result {
                error!(error = %e, "stream consumer failed");
            }
        })
    };

    let sweep_interval = config.exporter.sweep_interval_seconds;
    let sweeper_handle = (sweep_interval > 0).then(|| {
        let engine = engine.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            engine
                .run_sweeper(Duration::from_secs(sweep_interval), shutdown)
                .await;
        })
    });

    // ── Start HTTP server ──────────────────────────────────────

    let router = streamprom_api::build_router(engine);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.exporter.port)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "scrape endpoint listening");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // Wait for background tasks.
    let _ = consumer_handle.await;
    if let Some(handle) = sweeper_handle {
        let _ = handle.await;
    }

    info!("streamprom daemon stopped");
    Ok(())
}
