// crates/regionstats-core/src/store.rs

//! # SQLite Store
//!
//! Two tables, `regions` and `countries`, with every country pointing at
//! exactly one region. Writes are batched: one transaction and one cached
//! prepared statement per batch.

use crate::error::Result;
use crate::model::{Country, CountryRecord, Region};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r"
CREATE TABLE IF NOT EXISTS regions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS countries (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  alpha2_code TEXT NOT NULL,
  alpha3_code TEXT NOT NULL,
  population INTEGER NOT NULL DEFAULT 0,
  top_level_domain TEXT NOT NULL DEFAULT '[]',
  capital TEXT,
  region_id INTEGER NOT NULL,
  FOREIGN KEY (region_id) REFERENCES regions(id)
);

CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region_id);
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Max bound parameters per `IN (...)` lookup.
const LOOKUP_CHUNK: usize = 500;

/// Existing country that the feed overwrites in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryUpdate {
    pub id: i64,
    pub region_id: i64,
    pub record: CountryRecord,
}

/// Country that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCountry {
    pub region_id: i64,
    pub record: CountryRecord,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    /// Opening an already migrated WAL database takes no write lock, so
    /// readers are not blocked by a running ingest.
    fn configure(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;

        let mode: String = conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") && !mode.eq_ignore_ascii_case("memory") {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        }

        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Idempotent; only writes when `user_version` is behind.
    pub fn migrate(&self) -> Result<()> {
        if self.schema_version()? >= SCHEMA_VERSION {
            return Ok(());
        }
        self.conn.execute_batch(SCHEMA_V1)?;
        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i64> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Raw connection, for ad-hoc queries and test fixtures.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------------
    // REGIONS
    // -----------------------------------------------------------------------

    pub fn region_names(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT name FROM regions")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = BTreeSet::new();
        for name in rows {
            names.insert(name?);
        }
        Ok(names)
    }

    /// Name -> id for every stored region.
    pub fn region_ids(&self) -> Result<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare_cached("SELECT name, id FROM regions")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut map = HashMap::new();
        for row in rows {
            let (name, id) = row?;
            map.insert(name, id);
        }
        Ok(map)
    }

    pub fn find_region(&self, name: &str) -> Result<Option<Region>> {
        let region = self
            .conn
            .query_row(
                "SELECT id, name FROM regions WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Region {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(region)
    }

    pub fn regions(&self) -> Result<Vec<Region>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM regions ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Region {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut regions = Vec::new();
        for region in rows {
            regions.push(region?);
        }
        Ok(regions)
    }

    pub fn insert_regions(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached("INSERT INTO regions(name) VALUES (?1)")?;
            for name in names {
                stmt.execute(params![name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // COUNTRIES
    // -----------------------------------------------------------------------

    /// Name -> id for the stored countries whose name is in `names`.
    pub fn countries_by_name(&self, names: &[&str]) -> Result<HashMap<String, i64>> {
        let mut map = HashMap::with_capacity(names.len());

        for chunk in names.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("SELECT name, id FROM countries WHERE name IN ({placeholders})");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (name, id) = row?;
                map.insert(name, id);
            }
        }

        Ok(map)
    }

    /// Overwrites codes, population, domains, capital and region in one
    /// transaction.
    pub fn update_countries(&mut self, rows: &[CountryUpdate]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE countries SET
                   alpha2_code = ?2,
                   alpha3_code = ?3,
                   population = ?4,
                   top_level_domain = ?5,
                   capital = ?6,
                   region_id = ?7
                 WHERE id = ?1",
            )?;
            for row in rows {
                let rec = &row.record;
                stmt.execute(params![
                    row.id,
                    rec.alpha2_code,
                    rec.alpha3_code,
                    rec.population,
                    serde_json::to_string(&rec.top_level_domain)?,
                    rec.capital,
                    row.region_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_countries(&mut self, rows: &[NewCountry]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO countries(
                   name, alpha2_code, alpha3_code, population,
                   top_level_domain, capital, region_id
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                let rec = &row.record;
                stmt.execute(params![
                    rec.name,
                    rec.alpha2_code,
                    rec.alpha3_code,
                    rec.population,
                    serde_json::to_string(&rec.top_level_domain)?,
                    rec.capital,
                    row.region_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn find_country(&self, name: &str) -> Result<Option<Country>> {
        let country = self
            .conn
            .query_row(
                "SELECT c.id, c.name, c.alpha2_code, c.alpha3_code, c.population,
                        c.top_level_domain, c.capital, r.name
                 FROM countries c
                 JOIN regions r ON r.id = c.region_id
                 WHERE c.name = ?1",
                params![name],
                parse_country_row,
            )
            .optional()?;
        Ok(country)
    }

    /// All countries ordered by name, optionally restricted to one region.
    pub fn countries(&self, region: Option<&str>) -> Result<Vec<Country>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT c.id, c.name, c.alpha2_code, c.alpha3_code, c.population,
                    c.top_level_domain, c.capital, r.name
             FROM countries c
             JOIN regions r ON r.id = c.region_id
             WHERE ?1 IS NULL OR r.name = ?1
             ORDER BY c.name ASC",
        )?;
        let rows = stmt.query_map(params![region], parse_country_row)?;

        let mut countries = Vec::new();
        for country in rows {
            countries.push(country?);
        }
        Ok(countries)
    }
}

fn parse_country_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Country> {
    let tld_json: String = row.get(5)?;
    let top_level_domain: Vec<String> = serde_json::from_str(&tld_json)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(err)))?;

    Ok(Country {
        id: row.get(0)?,
        name: row.get(1)?,
        alpha2_code: row.get(2)?,
        alpha3_code: row.get(3)?,
        population: row.get(4)?,
        top_level_domain,
        capital: row.get(6)?,
        region: row.get(7)?,
    })
}
