//! regionstats: command-line interface for regionstats-core
//!
//! Usage examples
//! --------------
//!
//! - Pull the public feed into ./regionstats.sqlite3
//!   $ regionstats ingest
//!
//! - Ingest a local snapshot into another database
//!   $ regionstats --db /tmp/countries.db ingest --input countries.json.gz
//!
//! - Per-region counts and population
//!   $ regionstats stats
//!   $ regionstats stats --json
//!
//! - Browse what is stored
//!   $ regionstats regions
//!   $ regionstats countries --region Europe
mod args;

use crate::args::{CliArgs, Commands, IngestArgs};
use anyhow::Context;
use clap::Parser;
use regionstats_core::{region_stats, run_sync, CountryFeed, FileFeed, Store};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut store = Store::open(&args.db)
        .with_context(|| format!("failed to open database at {}", args.db.display()))?;

    match args.command {
        Commands::Ingest(ingest) => {
            let feed = feed_from_args(&ingest)?;
            let report = run_sync(&mut store, feed.as_ref()).context("ingest aborted")?;

            if ingest.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for region in &report.regions_created {
                    println!("Region: {region} - Created");
                }
                for country in &report.countries_updated {
                    println!("Country: {country} - Updated");
                }
                for country in &report.countries_created {
                    println!("Country: {country} - Created");
                }
                println!(
                    "Done: {} regions created, {} countries updated, {} countries created",
                    report.regions_created.len(),
                    report.countries_updated.len(),
                    report.countries_created.len()
                );
            }
        }

        Commands::Stats { json } => {
            let stats = region_stats(&store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if stats.regions.is_empty() {
                println!("No regions stored. Run `regionstats ingest` first.");
            } else {
                println!("{:<24} {:>10} {:>16}", "Region", "Countries", "Population");
                for r in &stats.regions {
                    println!(
                        "{:<24} {:>10} {:>16}",
                        r.name, r.number_countries, r.total_population
                    );
                }
            }
        }

        Commands::Regions => {
            for region in store.regions()? {
                println!("{}", region.name);
            }
        }

        Commands::Countries { region } => {
            ensure_region(&store, region.as_deref())?;
            for c in store.countries(region.as_deref())? {
                println!(
                    "{} ({}/{}): {}, capital: {}, population: {}, tld: {}",
                    c.name(),
                    c.alpha2_code,
                    c.alpha3_code,
                    c.region,
                    c.capital().unwrap_or("-"),
                    c.population,
                    c.top_level_domains()
                );
            }
        }
    }

    Ok(())
}

/// Fails when a `--region` filter names a region that is not stored.
fn ensure_region(store: &Store, region: Option<&str>) -> anyhow::Result<()> {
    if let Some(name) = region {
        if store.find_region(name)?.is_none() {
            anyhow::bail!("region {name} not found");
        }
    }
    Ok(())
}

fn feed_from_args(args: &IngestArgs) -> anyhow::Result<Box<dyn CountryFeed>> {
    if let Some(path) = &args.input {
        return Ok(Box::new(FileFeed::new(path)));
    }

    #[cfg(feature = "fetch")]
    {
        let feed = match &args.url {
            Some(url) => regionstats_core::HttpFeed::new(url.as_str()),
            None => regionstats_core::HttpFeed::default(),
        };
        Ok(Box::new(feed.with_timeout(std::time::Duration::from_secs(
            args.timeout_secs,
        ))))
    }

    #[cfg(not(feature = "fetch"))]
    {
        anyhow::bail!("built without 'fetch'; pass --input <file>")
    }
}
