// crates/regionstats-core/src/sync.rs

//! # Feed Reconciliation
//!
//! Brings the store in line with a feed in a fixed number of round-trips:
//!
//! 1. create the regions the store has not seen (one batch),
//! 2. look up existing countries by name,
//! 3. partition the feed into updates and creations ([`plan_sync`]),
//! 4. write the updates (one batch), then the creations (one batch).
//!
//! Each batch commits on its own. A failure in step 4 leaves the regions of
//! step 1 in place.

use crate::error::{RegionStatsError, Result};
use crate::feed::CountryFeed;
use crate::model::CountryRecord;
use crate::store::{CountryUpdate, NewCountry, Store};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{error, info};

/// The partitioned feed, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_update: Vec<CountryUpdate>,
    pub to_create: Vec<NewCountry>,
}

/// What a run changed, by name, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub regions_created: Vec<String>,
    pub countries_updated: Vec<String>,
    pub countries_created: Vec<String>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.regions_created.is_empty()
            && self.countries_updated.is_empty()
            && self.countries_created.is_empty()
    }
}

/// Distinct region names referenced by `records` and missing from `existing`,
/// sorted.
pub fn new_region_names(records: &[CountryRecord], existing: &BTreeSet<String>) -> Vec<String> {
    records
        .iter()
        .map(|r| r.region.as_str())
        .filter(|name| !existing.contains(*name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Splits `records` into updates (name already stored) and creations.
///
/// When a name repeats inside the feed the last record wins, keeping the
/// position of the first.
pub fn plan_sync(
    records: Vec<CountryRecord>,
    region_ids: &HashMap<String, i64>,
    existing: &HashMap<String, i64>,
) -> Result<SyncPlan> {
    let mut plan = SyncPlan::default();
    // name -> index into to_update / to_create
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let region_id = *region_ids.get(&record.region).ok_or_else(|| {
            RegionStatsError::InvalidData(format!(
                "region {:?} of country {:?} is not stored",
                record.region, record.name
            ))
        })?;

        match existing.get(&record.name) {
            Some(&id) => {
                let row = CountryUpdate {
                    id,
                    region_id,
                    record,
                };
                match seen.get(&row.record.name) {
                    Some(&idx) => plan.to_update[idx] = row,
                    None => {
                        seen.insert(row.record.name.clone(), plan.to_update.len());
                        plan.to_update.push(row);
                    }
                }
            }
            None => {
                let row = NewCountry { region_id, record };
                match seen.get(&row.record.name) {
                    Some(&idx) => plan.to_create[idx] = row,
                    None => {
                        seen.insert(row.record.name.clone(), plan.to_create.len());
                        plan.to_create.push(row);
                    }
                }
            }
        }
    }

    Ok(plan)
}

/// Fetches the feed and reconciles it. A fetch or parse failure aborts the
/// run before anything is written.
pub fn run_sync(store: &mut Store, feed: &dyn CountryFeed) -> Result<SyncReport> {
    let source = feed.describe();
    info!(%source, "fetching country feed");

    let records = feed.fetch().map_err(|err| {
        error!(%source, %err, "error fetching data");
        err
    })?;

    info!(%source, records = records.len(), "feed loaded");
    sync_records(store, records)
}

/// Reconciles already loaded records against the store.
pub fn sync_records(store: &mut Store, records: Vec<CountryRecord>) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    // 1. Regions first, so every country below has a region id.
    let existing_regions = store.region_names()?;
    let new_regions = new_region_names(&records, &existing_regions);
    store.insert_regions(&new_regions)?;
    for region in &new_regions {
        info!(%region, "region created");
    }
    report.regions_created = new_regions;

    // 2. Lookups, built once.
    let region_ids = store.region_ids()?;
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let existing_countries = store.countries_by_name(&names)?;

    // 3. Partition.
    let plan = plan_sync(records, &region_ids, &existing_countries)?;

    // 4. Two batched writes.
    store.update_countries(&plan.to_update)?;
    for row in &plan.to_update {
        info!(country = %row.record.name, "country updated");
    }
    report.countries_updated = plan
        .to_update
        .into_iter()
        .map(|row| row.record.name)
        .collect();

    store.insert_countries(&plan.to_create)?;
    for row in &plan.to_create {
        info!(country = %row.record.name, "country created");
    }
    report.countries_created = plan
        .to_create
        .into_iter()
        .map(|row| row.record.name)
        .collect();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, region: &str, population: i64) -> CountryRecord {
        CountryRecord {
            name: name.to_string(),
            alpha2_code: "XX".to_string(),
            alpha3_code: "XXX".to_string(),
            population,
            region: region.to_string(),
            top_level_domain: Vec::new(),
            capital: None,
        }
    }

    fn ids(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(n, i)| (n.to_string(), *i)).collect()
    }

    #[test]
    fn new_region_names_are_distinct_and_skip_existing() {
        let records = vec![
            rec("Nigeria", "Africa", 1),
            rec("Egypt", "Africa", 1),
            rec("Brazil", "Americas", 1),
            rec("France", "Europe", 1),
        ];
        let existing: BTreeSet<String> = ["Europe".to_string()].into_iter().collect();
        assert_eq!(
            new_region_names(&records, &existing),
            vec!["Africa".to_string(), "Americas".to_string()]
        );
    }

    #[test]
    fn partitions_by_existing_name() {
        let records = vec![rec("Nigeria", "Africa", 10), rec("Kenya", "Africa", 20)];
        let plan = plan_sync(
            records,
            &ids(&[("Africa", 1)]),
            &ids(&[("Nigeria", 7)]),
        )
        .unwrap();

        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].id, 7);
        assert_eq!(plan.to_update[0].region_id, 1);
        assert_eq!(plan.to_update[0].record.population, 10);

        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].record.name, "Kenya");
    }

    #[test]
    fn last_duplicate_wins() {
        let records = vec![
            rec("Chad", "Africa", 1),
            rec("Mali", "Africa", 5),
            rec("Chad", "Africa", 2),
            rec("Peru", "Americas", 3),
            rec("Peru", "Americas", 4),
        ];
        let plan = plan_sync(
            records,
            &ids(&[("Africa", 1), ("Americas", 2)]),
            &ids(&[("Peru", 9)]),
        )
        .unwrap();

        let created: Vec<(&str, i64)> = plan
            .to_create
            .iter()
            .map(|r| (r.record.name.as_str(), r.record.population))
            .collect();
        assert_eq!(created, vec![("Chad", 2), ("Mali", 5)]);

        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].record.population, 4);
    }

    #[test]
    fn unknown_region_is_invalid_data() {
        let err = plan_sync(vec![rec("Tuvalu", "Oceania", 1)], &HashMap::new(), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, RegionStatsError::InvalidData(_)));
    }

    #[test]
    fn empty_feed_is_a_noop() {
        let mut store = Store::open_in_memory().unwrap();
        let report = sync_records(&mut store, Vec::new()).unwrap();
        assert!(report.is_noop());
        assert!(store.regions().unwrap().is_empty());
    }
}
