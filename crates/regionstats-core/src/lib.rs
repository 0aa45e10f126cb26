// crates/regionstats-core/src/lib.rs

//! # regionstats-core
//!
//! Ingests a JSON feed of country records into SQLite, grouped by region,
//! and answers the per-region aggregate query:
//!
//! ```text
//! {"regions": [{"name": "Africa", "number_countries": 2, "total_population": 300000000}]}
//! ```
//!
//! The crate is synchronous throughout. The HTTP feed client (`fetch`) and
//! gzip snapshot support (`compact`) are feature gated and on by default.

pub mod error;
pub mod feed;
pub mod model;
pub mod stats;
pub mod store;
pub mod sync;

// Re-exports
pub use crate::error::{RegionStatsError, Result};
pub use crate::feed::{parse_records, CountryFeed, FileFeed, StaticFeed};
#[cfg(feature = "fetch")]
pub use crate::feed::HttpFeed;
pub use crate::model::{Country, CountryRecord, Region};
pub use crate::stats::{region_stats, RegionStats, StatsResponse};
pub use crate::store::Store;
pub use crate::sync::{plan_sync, run_sync, sync_records, SyncPlan, SyncReport};
