// crates/regionstats-core/src/stats.rs
use crate::error::Result;
use crate::store::Store;
use serde::{Deserialize, Serialize};

/// Aggregate figures for one region.
///
/// Regions without countries report `0` for both fields, never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStats {
    pub name: String,
    pub number_countries: i64,
    pub total_population: i64,
}

/// Body of `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub regions: Vec<RegionStats>,
}

impl StatsResponse {
    pub fn region(&self, name: &str) -> Option<&RegionStats> {
        self.regions.iter().find(|r| r.name == name)
    }
}

/// One grouped query over every region, ordered by name.
pub fn region_stats(store: &Store) -> Result<StatsResponse> {
    let mut stmt = store.connection().prepare_cached(
        "SELECT r.name,
                COUNT(c.id) AS number_countries,
                COALESCE(SUM(c.population), 0) AS total_population
         FROM regions r
         LEFT JOIN countries c ON c.region_id = r.id
         GROUP BY r.id, r.name
         ORDER BY r.name ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(RegionStats {
            name: row.get(0)?,
            number_countries: row.get(1)?,
            total_population: row.get(2)?,
        })
    })?;

    let mut regions = Vec::new();
    for region in rows {
        regions.push(region?);
    }
    Ok(StatsResponse { regions })
}
