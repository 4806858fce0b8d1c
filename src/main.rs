//! Bull Feed Engine
//!
//! Ranking service for the Bull Feed of trading analyses.
//!
//! # Commands
//!
//! - **serve**: REST API over an in-memory snapshot (default)
//! - **rank**: rank a snapshot file once and print the page as JSON
//!
//! # Graceful Shutdown
//!
//! `serve` handles SIGTERM and SIGINT and lets in-flight requests complete.

use anyhow::Context;
use bullfeed::api::{self, AppState};
use bullfeed::feed::{
    ContentTypeFilter, FeedEngine, FeedQuery, FeedStrategy, MarketFilter, Snapshot, SnapshotStore,
};
use bullfeed::Config;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "bullfeed", version, about = "Bull Feed ranking engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Rank a snapshot file and print the result
    Rank(RankArgs),
}

#[derive(Debug, Args)]
struct RankArgs {
    /// Snapshot JSON: an array of records or a `{data, error}` envelope
    #[arg(long)]
    snapshot: PathBuf,
    /// hot, top, smart_money or fresh
    #[arg(long)]
    strategy: Option<String>,
    /// Market to include; repeat for several
    #[arg(long = "market")]
    markets: Vec<String>,
    /// Content type to include; repeat for several
    #[arg(long = "type")]
    types: Vec<String>,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value_t = 0)]
    offset: usize,
    #[arg(long)]
    limit: Option<usize>,
    /// Reference instant for the hot tab (RFC 3339)
    #[arg(long)]
    now: Option<String>,
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with structured logging
    init_tracing();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Rank(args) => rank(args),
    }
}

async fn serve() -> anyhow::Result<()> {
    info!("═══════════════════════════════════════════════════════════════");
    info!("  🐂 Bull Feed Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("✅ Configuration loaded and validated");

    let store = match &config.feed.snapshot_path {
        Some(path) => {
            let snapshot = Snapshot::from_path(path)?;
            info!(
                "✅ Snapshot loaded: {} records ({} skipped)",
                snapshot.len(),
                snapshot.skipped
            );
            SnapshotStore::new(snapshot.records)
        }
        None => {
            info!("📭 No snapshot configured, starting empty");
            SnapshotStore::default()
        }
    };

    let state = AppState::new(config.clone(), store);

    #[cfg(feature = "prometheus")]
    let state = match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("✅ Prometheus recorder installed");
            state.with_prometheus(handle)
        }
        Err(e) => {
            tracing::warn!("⚠️ Prometheus recorder unavailable: {}", e);
            state
        }
    };

    info!("  📡 API: http://{}:{}", config.api.host, config.api.port);
    info!(
        "  🔗 Health: http://{}:{}/health",
        config.api.host, config.api.port
    );

    api::start_server(Arc::new(state), shutdown_signal()).await?;

    info!("👋 Bull Feed Engine stopped gracefully");
    Ok(())
}

fn rank(args: RankArgs) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let now = match args.now.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --now timestamp '{}'", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let strategy = match args.strategy.as_deref() {
        Some(raw) => raw.parse::<FeedStrategy>()?,
        None => config.feed.default_strategy,
    };

    let query = FeedQuery {
        markets: MarketFilter::parse_items(args.markets.iter().map(String::as_str))?,
        content_types: ContentTypeFilter::parse_items(args.types.iter().map(String::as_str))?,
        search: args.search,
        strategy,
        offset: args.offset,
        limit: args.limit,
    };
    query.validate()?;

    let snapshot = Snapshot::from_path(&args.snapshot)?;
    let page = FeedEngine::from_config(&config.feed).select(&snapshot.records, &query, now);

    let stdout = std::io::stdout().lock();
    if args.pretty {
        serde_json::to_writer_pretty(stdout, &page)?;
    } else {
        serde_json::to_writer(stdout, &page)?;
    }
    println!();

    Ok(())
}

/// Initialize structured logging with tracing
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Default log levels
        EnvFilter::new("bullfeed=debug,tower_http=debug,info")
    });

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `rank` output stays clean
    if std::env::var("LOG_FORMAT").map(|f| f.eq_ignore_ascii_case("json")).unwrap_or(false) {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(std::env::var("NO_COLOR").is_err())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("📴 Shutdown signal received");
}
