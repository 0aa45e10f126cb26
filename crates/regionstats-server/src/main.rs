use anyhow::Context;
use clap::Parser;
use regionstats_core::HttpFeed;
use regionstats_server::{app, spawn_periodic_sync, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "regionstats-server")]
#[command(about = "HTTP service for per-region country statistics")]
struct Args {
    #[arg(long, default_value = "./regionstats.sqlite3")]
    db: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
    /// Re-ingest the feed every N seconds (disabled when unset)
    #[arg(long)]
    sync_interval_secs: Option<u64>,
    /// Feed URL used by the periodic ingest
    #[arg(long)]
    url: Option<String>,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    tracing::info!(db = %args.db.display(), "Starting regionstats server");

    // Create the schema up front so a bad path fails here, not on first request.
    let db = args.db.clone();
    tokio::task::spawn_blocking(move || regionstats_core::Store::open(&db).map(|_| ()))
        .await?
        .with_context(|| format!("failed to open database at {}", args.db.display()))?;

    if let Some(secs) = args.sync_interval_secs {
        let feed = match args.url {
            Some(url) => HttpFeed::new(url),
            None => HttpFeed::default(),
        }
        .with_timeout(Duration::from_secs(args.timeout_secs));

        tracing::info!(url = feed.url(), every_secs = secs, "Periodic ingest enabled");
        spawn_periodic_sync(args.db.clone(), feed, Duration::from_secs(secs.max(1)));
    }

    let listener = TcpListener::bind(args.bind).await?;
    tracing::info!("Listening on {}", args.bind);
    axum::serve(listener, app(AppState::new(args.db))).await?;

    Ok(())
}
