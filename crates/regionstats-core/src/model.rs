// crates/regionstats-core/src/model.rs
use serde::{Deserialize, Deserializer, Serialize};

/// One country entry as it comes from the feed:
/// {
///   "name": "Afghanistan",
///   "alpha2Code": "AF",
///   "alpha3Code": "AFG",
///   "population": 27657145,
///   "region": "Asia",
///   "topLevelDomain": [".af"],
///   "capital": "Kabul"
/// }
///
/// Unknown fields are ignored so the full restcountries-style document parses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    #[serde(rename = "alpha2Code")]
    pub alpha2_code: String,
    #[serde(rename = "alpha3Code")]
    pub alpha3_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub population: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(rename = "topLevelDomain", default, deserialize_with = "one_or_many")]
    pub top_level_domain: Vec<String>,
    #[serde(default)]
    pub capital: Option<String>,
}

/// A region row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
}

/// A country row joined with its region name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub alpha2_code: String,
    pub alpha3_code: String,
    pub population: i64,
    pub top_level_domain: Vec<String>,
    pub capital: Option<String>,
    pub region: String,
}

impl Country {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capital(&self) -> Option<&str> {
        self.capital.as_deref()
    }

    /// Domains joined for display, e.g. `.ch, .swiss`.
    pub fn top_level_domains(&self) -> String {
        self.top_level_domain.join(", ")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `topLevelDomain` is a list in the feed, but single strings show up in
/// hand-made snapshots.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if s.is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}
