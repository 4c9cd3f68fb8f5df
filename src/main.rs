//! Vantage - Scene-Context Acquisition and Description Toolkit
//!
//! This is the main entry point for the Vantage application: point it at a
//! captured photo and it assembles best-effort location context before asking
//! a vision model to describe the surroundings. It also exposes the
//! provider-fallback translator and the nearby-POI trip planner.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vantage::cli::{Args, Commands};
use vantage::config::Config;
use vantage::geocode::PlaceResolver;
use vantage::location::{AccuracyTier, Coordinate, LocationResolver};
use vantage::pipeline::CapturePipeline;
use vantage::planner::TripPlanner;
use vantage::translate::{TranslationRequest, TranslationResolver};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Secrets from the environment win over the config file
    config.apply_env_overrides();

    // Execute command
    match args.command {
        Commands::Describe { image, lat, lon } => {
            info!("Describing scene from: {}", image.display());

            let coordinate_override = match (lat, lon) {
                (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
                _ => None,
            };

            let mut pipeline = CapturePipeline::new(&config);
            match pipeline.analyze(&image, coordinate_override).await? {
                Some(report) => {
                    println!("\nAnalysis");
                    println!("{}", "-".repeat(40));
                    if let Some(place) = &report.context.place {
                        println!("{}", place);
                    }
                    if let Some(landmark) = &report.context.landmark {
                        println!("Nearest landmark: {}", landmark);
                    }
                    println!("\n{}", report.description);
                }
                None => {
                    println!("A capture is already being analyzed.");
                }
            }
        }
        Commands::Translate {
            text,
            target,
            source,
        } => {
            info!("Translating to {}", target);

            let mut request = TranslationRequest::new(text, target);
            if let Some(source) = source {
                request = request.with_source(source);
            }

            let resolver = TranslationResolver::from_config(&config.translate);
            let translation = resolver.translate(&request).await?;
            println!("{}", translation);
        }
        Commands::Plan { lat, lon, limit } => {
            info!("Planning nearby points of interest");

            let coordinate_override = match (lat, lon) {
                (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
                _ => None,
            };

            let planner = TripPlanner::new(&config);
            let items = planner.plan_nearby(coordinate_override, limit).await?;

            if items.is_empty() {
                println!("No points of interest found.");
            } else {
                for (index, item) in items.iter().enumerate() {
                    println!("{:2}. {}", index + 1, item.title);
                    if let Some(detail) = &item.detail {
                        println!("    {}", detail);
                    }
                    if let Some(url) = &item.url {
                        println!("    {}", url);
                    }
                }
            }
        }
        Commands::Locate { fresh } => {
            info!("Resolving current position");

            let resolver = LocationResolver::new(&config.location);
            let resolved = if fresh {
                resolver.fresh_fix().await
            } else {
                resolver.resolve().await
            };

            match resolved {
                Some(resolved) => {
                    let tier = match resolved.accuracy {
                        AccuracyTier::Cached => "cached",
                        AccuracyTier::Fresh => "fresh",
                    };
                    println!(
                        "Position: {:.5}, {:.5} ({})",
                        resolved.coordinate.latitude, resolved.coordinate.longitude, tier
                    );

                    let places = PlaceResolver::new(&config.geocode);
                    match places.resolve(resolved.coordinate).await {
                        Some(place) => println!("Place: {}", place),
                        None => println!("Place: unknown"),
                    }
                }
                None => {
                    println!("No position could be resolved.");
                }
            }
        }
    }

    info!("Vantage completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let vantage_dir = std::env::current_dir()?.join(".vantage");
    let log_dir = vantage_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "vantage.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
