use clap::Parser;
use intake_geo::config::Settings;
use intake_geo::core::GeocodingResolver;
use intake_geo::jobs::{GeocodeJob, JobOptions};
use intake_geo::services::{NominatimClient, PostgresClient};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Geocode referral patient addresses with OpenStreetMap Nominatim
#[derive(Debug, Parser)]
#[command(name = "geocode-referrals")]
#[command(about = "Geocode referral patient addresses and store the coordinates")]
struct Cli {
    /// Configuration file (defaults to config/default.toml + config/local.toml)
    #[arg(long, env = "INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of referrals to geocode
    #[arg(long)]
    limit: Option<usize>,

    /// Re-geocode every referral, including ones already geocoded or failed
    #[arg(long)]
    force_refresh: bool,

    /// Show what would be geocoded without calling the geocoding service
    #[arg(long)]
    dry_run: bool,

    /// User agent sent to the geocoding service
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    intake_geo::logging::init(&settings.logging);

    if let Some(user_agent) = cli.user_agent.clone() {
        settings.geocoder.user_agent = user_agent;
    }

    match run(&cli, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Geocoding run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let postgres = PostgresClient::from_settings(&settings.database).await?;

    let client = NominatimClient::new(
        settings.geocoder.base_url.clone(),
        settings.geocoder.user_agent.clone(),
        settings.geocoder.timeout(),
    )?;
    let resolver = GeocodingResolver::new(client, settings.geocoder.retry_policy());

    info!(
        "Geocoding with {} (user agent: {}, request interval: {:?})",
        settings.geocoder.base_url,
        resolver.service().user_agent(),
        resolver.policy().request_interval
    );

    let options = JobOptions {
        force_refresh: cli.force_refresh,
        limit: cli.limit,
        dry_run: cli.dry_run,
    };

    let report = GeocodeJob::new(&postgres, &resolver).run(options).await?;

    if report.dry_run {
        for referral in &report.planned {
            println!(
                "ID {}: {} ({}) - {}",
                referral.id,
                referral.patient_name.as_deref().unwrap_or("unknown patient"),
                referral.order_number.as_deref().unwrap_or("no order number"),
                referral.patient_address
            );
        }
        return Ok(());
    }

    println!("Geocoding statistics:");
    println!("   Total requests: {}", report.resolver.requests);
    println!("   Successful: {}", report.succeeded);
    println!("   Failed: {}", report.failed);
    if report.resolver.requests > 0 {
        println!("   Success rate: {:.1}%", report.resolver.success_rate());
    }

    let summary = postgres.geocoding_summary().await?;

    println!("Database summary:");
    println!("   Total addresses: {}", summary.total);
    println!("   Successfully geocoded: {}", summary.geocoded);
    println!("   Failed geocoding: {}", summary.failed);
    println!("   Not yet processed: {}", summary.pending());

    Ok(())
}
