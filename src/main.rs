//! # Equal Time Area Command Line
//!
//! Thin binary over the library: loads configuration, runs one search against
//! the 2GIS provider and prints the shared area as a GeoJSON FeatureCollection.
//!
//! ```text
//! equal-time-area search --person 55.75,37.62 --person 55.70,37.60 --tolerance 5
//! equal-time-area init-config --path equal-time.toml
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use equal_time_lib::config::{Config, DEFAULT_CONFIG_PATH};
use equal_time_lib::provider::DgisClient;
use equal_time_lib::render::{describe_trace, feature_collection, result_properties};
use equal_time_lib::search::{EqualTimeSearch, SearchOutcome, SearchRequest};
use equal_time_lib::Coordinate;
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "equal-time-area")]
#[command(about = "Find the area every participant reaches in about the same travel time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for the shared equal-time area
    Search(SearchArgs),
    /// Write the default configuration file
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Participant origin as LAT,LON (repeat for each participant)
    #[arg(long = "person", value_parser = parse_coordinate, required = true)]
    people: Vec<Coordinate>,

    /// Midpoint tolerance in minutes
    #[arg(long)]
    tolerance: Option<u32>,

    /// First travel-time budget in minutes
    #[arg(long)]
    start_minutes: Option<u32>,

    /// Budget increase per round in minutes
    #[arg(long)]
    step_minutes: Option<u32>,

    /// Departure time, RFC 3339 (e.g. 2025-10-04T10:00:00Z)
    #[arg(long)]
    start_time: Option<DateTime<Utc>>,

    /// Polygon detail level, 0..1
    #[arg(long)]
    detailing: Option<f64>,

    /// Configuration file [default: equal-time.toml]
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{raw}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinate out of range: {lat},{lon}"));
    }
    Ok(Coordinate::new(lat, lon))
}

/// Main application entry point.
fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_search(args))
        }
        Commands::InitConfig { path } => {
            Config::default()
                .save_to_path(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_search(args: SearchArgs) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    if config.provider.api_key.is_empty() {
        warn!("No API key configured; set DGIS_API_KEY or provider.api_key");
    }
    if args.people.len() < 2 {
        bail!("at least 2 participants are required (use --person twice)");
    }

    let client = DgisClient::new(&config.provider).context("building HTTP client")?;
    let engine = EqualTimeSearch::new(client, config.search);

    let participants = args.people.len();
    let tolerance = args
        .tolerance
        .unwrap_or(engine.config().tolerance_minutes);
    let request = SearchRequest {
        people: args.people,
        start_minutes: args.start_minutes,
        step_minutes: args.step_minutes,
        tolerance_minutes: Some(tolerance),
        start_time: args.start_time,
        detailing: args.detailing,
    };

    let report = engine.run(&request).await.context("equal-time search failed")?;
    info!("attempts: {}", describe_trace(&report.trace));

    match &report.outcome {
        SearchOutcome::Found { region, minutes } => {
            info!("shared area found at {minutes} min");
            let props = result_properties(participants, tolerance, &report.trace);
            let fc = feature_collection(Some(region), &props);
            println!("{}", serde_json::to_string_pretty(&fc)?);
            Ok(ExitCode::SUCCESS)
        }
        SearchOutcome::NotFound => {
            let body = serde_json::json!({
                "message": "No shared meeting area found for all participants within the time cap.",
                "debug": report.trace,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
