// crates/regionstats-core/src/feed/file.rs
use super::{common_io, parse_records, CountryFeed};
use crate::error::Result;
use crate::model::CountryRecord;
use std::path::{Path, PathBuf};

/// A local snapshot of the feed (`.json`, or `.json.gz` with `compact`).
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CountryFeed for FileFeed {
    fn fetch(&self) -> Result<Vec<CountryRecord>> {
        let reader = common_io::open_stream(&self.path)?;
        parse_records(reader)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
