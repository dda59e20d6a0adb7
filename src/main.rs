//! `tripcost` - estimate what a trip will cost and how the budget splits

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};

use tripcost::{TripCostConfig, TripCostError, TripPlanner, TripRequest, logging};

/// Estimate daily trip costs from live, researched and static sources
#[derive(Parser, Debug)]
#[command(name = "tripcost", version, about)]
struct Cli {
    /// Destination city
    city: String,

    /// First day of the trip (YYYY-MM-DD)
    start_date: String,

    /// Last day of the trip, inclusive (YYYY-MM-DD)
    end_date: String,

    /// Number of travellers
    #[arg(short, long, default_value_t = 1)]
    people: u32,

    /// Total trip budget in USD
    #[arg(short, long)]
    budget: f64,

    /// Currency to additionally express the budget in
    #[arg(long, default_value = "USD")]
    currency: String,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the report on a single line
    #[arg(long)]
    compact: bool,
}

async fn run(cli: Cli, config: TripCostConfig) -> Result<()> {
    let planner = TripPlanner::from_config(&config).context("Failed to set up data sources")?;

    let request = TripRequest {
        city: cli.city,
        start_date: cli.start_date,
        end_date: cli.end_date,
        num_people: cli.people,
        total_budget: cli.budget,
        currency: cli.currency,
    };
    debug!(?request, "Planning trip");

    let report = planner.plan(request).await?;

    let output = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TripCostConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TripCostError>() {
                Some(trip_error) if trip_error.is_user_error() => {
                    eprintln!("{}", trip_error.user_message());
                }
                _ => {
                    error!("{e:#}");
                    eprintln!("Error: {e:#}");
                }
            }
            ExitCode::FAILURE
        }
    }
}
