use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "./regionstats.sqlite3";

/// CLI arguments for regionstats
#[derive(Debug, Parser)]
#[command(
    name = "regionstats",
    version,
    about = "Ingest the country feed and inspect per-region statistics"
)]
pub struct CliArgs {
    /// Path to the SQLite database (created on first use)
    #[arg(long = "db", global = true, default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Log filter used when RUST_LOG is unset (e.g. info, debug, regionstats_core=trace)
    #[arg(long = "log-level", global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the country feed and upsert regions and countries
    Ingest(IngestArgs),

    /// Print country count and total population per region
    Stats {
        /// Print the JSON document served by GET /stats
        #[arg(long)]
        json: bool,
    },

    /// List all regions
    Regions,

    /// List countries, optionally only those of one region
    Countries {
        /// Region name (exact match)
        #[arg(short = 'r', long = "region")]
        region: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Feed URL (defaults to the public countries.json)
    #[arg(long, conflicts_with = "input")]
    pub url: Option<String>,

    /// Read the feed from a local .json or .json.gz file instead of HTTP
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Timeout for the HTTP fetch, in seconds
    #[arg(long = "timeout-secs", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn ingest_defaults() {
        let args = CliArgs::try_parse_from(["regionstats", "ingest"]).unwrap();
        assert_eq!(args.db, PathBuf::from(DEFAULT_DB_PATH));
        match args.command {
            Commands::Ingest(ingest) => {
                assert_eq!(ingest.url, None);
                assert_eq!(ingest.input, None);
                assert_eq!(ingest.timeout_secs, 10);
                assert!(!ingest.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn url_and_input_are_mutually_exclusive() {
        let res = CliArgs::try_parse_from([
            "regionstats",
            "ingest",
            "--url",
            "http://localhost/countries.json",
            "--input",
            "countries.json",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn db_is_global() {
        let args =
            CliArgs::try_parse_from(["regionstats", "countries", "--region", "Asia", "--db", "x.db"])
                .unwrap();
        assert_eq!(args.db, PathBuf::from("x.db"));
        assert!(matches!(
            args.command,
            Commands::Countries { region: Some(ref r) } if r == "Asia"
        ));
    }
}
