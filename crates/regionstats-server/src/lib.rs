//! HTTP front for regionstats.
//!
//! - `GET /stats`  per-region country count and population total
//! - `GET /health` liveness
//!
//! Every request opens its own SQLite connection on the blocking pool; the
//! database file is the only shared state.

mod error;

pub use crate::error::AppError;

use axum::{extract::State, routing::get, Json, Router};
use regionstats_core::{region_stats, run_sync, CountryFeed, Store, StatsResponse, SyncReport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: PathBuf,
}

impl AppState {
    pub fn new(db: impl Into<PathBuf>) -> Self {
        Self { db: db.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let db = state.db.clone();
    let body = tokio::task::spawn_blocking(move || -> regionstats_core::Result<StatsResponse> {
        let store = Store::open(&db)?;
        region_stats(&store)
    })
    .await
    .map_err(|err| AppError::Internal(format!("stats task failed: {err}")))??;

    Ok(Json(body))
}

/// Opens the database at `db` and runs one ingest from `feed`. Blocking.
pub fn ingest_once(db: &Path, feed: &dyn CountryFeed) -> regionstats_core::Result<SyncReport> {
    let mut store = Store::open(db)?;
    run_sync(&mut store, feed)
}

/// Ingests `feed` every `every`, starting immediately.
///
/// Runs are sequential; a failed run is logged and the next tick proceeds.
pub fn spawn_periodic_sync<F>(db: PathBuf, feed: F, every: Duration) -> JoinHandle<()>
where
    F: CountryFeed + Clone + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let db = db.clone();
            let feed = feed.clone();
            match tokio::task::spawn_blocking(move || ingest_once(&db, &feed)).await {
                Ok(Ok(report)) => info!(
                    regions_created = report.regions_created.len(),
                    countries_updated = report.countries_updated.len(),
                    countries_created = report.countries_created.len(),
                    "scheduled ingest finished"
                ),
                Ok(Err(err)) => error!(%err, "scheduled ingest failed"),
                Err(err) => error!(%err, "scheduled ingest task failed"),
            }
        }
    })
}
