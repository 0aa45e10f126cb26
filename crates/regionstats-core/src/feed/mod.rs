// crates/regionstats-core/src/feed/mod.rs

//! # Country Feed
//!
//! Handles the Physical Layer (HTTP, files, decompression) and hands a
//! reader to [`parse_records`]. Every source yields the same document: a
//! JSON array of [`CountryRecord`] objects.

use crate::error::Result;
use crate::model::CountryRecord;
use std::io::Read;
use std::time::Duration;

mod common_io;
mod file;
#[cfg(feature = "fetch")]
mod http;

pub use file::FileFeed;
#[cfg(feature = "fetch")]
pub use http::HttpFeed;

pub const COUNTRIES_DATA_URL: &str = "https://storage.googleapis.com/dcr-django-test/countries.json";

/// Fixed timeout applied to the outbound fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of country records.
///
/// Implementations either return the complete list or fail; there is no
/// partial result, so a failed fetch never reaches the store.
pub trait CountryFeed {
    fn fetch(&self) -> Result<Vec<CountryRecord>>;

    /// Short human readable description used in log lines.
    fn describe(&self) -> String;
}

/// Records already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    records: Vec<CountryRecord>,
}

impl StaticFeed {
    pub fn new(records: Vec<CountryRecord>) -> Self {
        Self { records }
    }
}

impl CountryFeed for StaticFeed {
    fn fetch(&self) -> Result<Vec<CountryRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory records", self.records.len())
    }
}

/// Parses the feed document from any reader.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<CountryRecord>> {
    let records: Vec<CountryRecord> = serde_json::from_reader(reader)?;
    Ok(records)
}
