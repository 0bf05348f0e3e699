// Command-line driver: reads a saved search snapshot and prints the best package as JSON
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;

use travel_package_optimizer::provider::{
    activities_from_value, flight_offers_from_value, hotel_offers_from_value,
};
use travel_package_optimizer::{OfferNormalizer, OptimizerConfig, PackageOptimizer, TripRequest};

#[derive(Parser)]
#[command(name = "package-optimizer")]
#[command(about = "Pick the cheapest flight + hotel + activities package for a trip", long_about = None)]
#[command(version)]
struct Cli {
    /// Search snapshot: {"trip": ..., "flights": ..., "hotels": ..., "activities": ...}
    snapshot: PathBuf,

    /// Maximum number of activities added to the package
    #[arg(long)]
    max_activities: Option<usize>,

    /// Number of ranked flight+hotel alternatives to report
    #[arg(long)]
    alternatives: Option<usize>,

    /// Estimated food spend per adult per night, in currency minor units
    #[arg(long)]
    meal_allowance: Option<u64>,

    /// Optimizer config file (JSON); flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Deserialize)]
struct SearchSnapshot {
    trip: TripRequest,
    #[serde(default)]
    flights: Value,
    #[serde(default)]
    hotels: Value,
    #[serde(default)]
    activities: Value,
}

fn load_config(cli: &Cli) -> Result<OptimizerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => OptimizerConfig::default(),
    };

    if let Some(max_activities) = cli.max_activities {
        config.max_activities = max_activities;
    }
    if let Some(alternatives) = cli.alternatives {
        config.max_alternatives = alternatives;
    }
    if let Some(meal_allowance) = cli.meal_allowance {
        config.daily_meal_allowance_minor = meal_allowance;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let text = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("reading snapshot {}", cli.snapshot.display()))?;
    let snapshot: SearchSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing snapshot {}", cli.snapshot.display()))?;

    let normalizer = OfferNormalizer::new();
    let flights = normalizer.normalize_all(flight_offers_from_value(snapshot.flights)?)?;
    let hotels = normalizer.normalize_all(hotel_offers_from_value(snapshot.hotels)?)?;
    let activities = normalizer.normalize_all(activities_from_value(snapshot.activities)?)?;

    let optimizer = PackageOptimizer::new(config);
    match optimizer.optimize(&snapshot.trip, &flights, &hotels, &activities) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) if err.is_no_results() => {
            println!("No deals found: {}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
