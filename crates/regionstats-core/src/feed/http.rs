// crates/regionstats-core/src/feed/http.rs
#![cfg(feature = "fetch")]

use super::{parse_records, CountryFeed, COUNTRIES_DATA_URL, DEFAULT_FETCH_TIMEOUT};
use crate::error::Result;
use crate::model::CountryRecord;
use std::time::Duration;

/// Downloads the feed with a blocking client.
///
/// Must not be called from inside an async task; the server wraps it in
/// `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    url: String,
    timeout: Duration,
}

impl Default for HttpFeed {
    fn default() -> Self {
        Self::new(COUNTRIES_DATA_URL)
    }
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CountryFeed for HttpFeed {
    fn fetch(&self) -> Result<Vec<CountryRecord>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client.get(&self.url).send()?.error_for_status()?;
        let body = response.bytes()?;

        parse_records(body.as_ref())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
