use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use chicago_oracle::config;
use chicago_oracle::geocode::{self, AddressComponents, Coordinate};
use chicago_oracle::pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "chicago-oracle",
    version,
    about = "Crop geotagged photos for the feed and caption them with reverse-geocoded addresses"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Coordinate to use instead of EXIF GPS; on its own, just look it up
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
    at: Option<String>,

    /// Caption to use when no address is available
    #[arg(long, value_name = "TEXT")]
    fallback: Option<String>,

    /// Enrich and report without writing prepared images
    #[arg(long)]
    dry_run: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let coordinate: Option<Coordinate> = cli
        .at
        .as_deref()
        .map(str::parse::<Coordinate>)
        .transpose()
        .context("Invalid --at value")?;

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override dry_run from CLI flag
    if cli.dry_run {
        config.output.dry_run = true;
    }

    let enricher = pipeline::build_enricher(&config);
    log::debug!("Geocoders: {}", enricher.provider_names().join(" → "));

    // Handle a bare --at lookup
    if cli.paths.is_empty() {
        let Some(coordinate) = coordinate else {
            anyhow::bail!("No input files, directories or --at coordinate specified. Use --help for usage.");
        };
        let address = enricher.enrich(coordinate.lat, coordinate.lng).await;
        print_lookup(coordinate, address.as_ref(), cli.fallback.as_deref(), cli.json)?;
        return Ok(());
    }

    // Collect images
    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    log::info!("Found {} image(s) to process", images.len());
    if config.output.dry_run {
        log::info!("DRY RUN — no prepared images will be written");
    }

    // Process each image
    let mut records = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!(
            "[{}/{}] Processing: {}",
            i + 1,
            total,
            image_path.display()
        );

        let mut record = pipeline::process_image(image_path, &enricher, &config, coordinate).await;

        // Recaption with the caller's fallback
        if let Some(fallback) = cli.fallback.as_deref() {
            record.display = geocode::to_display_string(record.address.as_ref(), Some(fallback));
            record.descriptive =
                geocode::to_descriptive_string(record.address.as_ref(), Some(fallback));
        }

        if let Some(ref err) = record.error {
            log::error!("  Error: {err}");
        }
        log::info!("  {}", record.descriptive);
        if let Some(ref prepared) = record.prepared_path {
            log::info!("  Prepared: {}", prepared.display());
        }

        records.push(record);
    }

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    // Summary
    let located = records.iter().filter(|r| r.address.is_some()).count();
    let failed = records.iter().filter(|r| r.error.is_some()).count();
    log::info!(
        "Done: {located} of {total} images captioned with an address, {failed} failed to prepare"
    );

    Ok(())
}

/// Print the result of a single-coordinate lookup.
fn print_lookup(
    coordinate: Coordinate,
    address: Option<&AddressComponents>,
    fallback: Option<&str>,
    json: bool,
) -> Result<()> {
    let display = geocode::to_display_string(address, fallback);
    let descriptive = geocode::to_descriptive_string(address, fallback);

    if json {
        let out = serde_json::json!({
            "coordinate": coordinate,
            "address": address,
            "display": display,
            "descriptive": descriptive,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Coordinate:  {coordinate}");
    println!("Display:     {display}");
    println!("Descriptive: {descriptive}");
    if let Some(formatted) = address.and_then(|a| a.formatted_address.as_deref()) {
        println!("Formatted:   {formatted}");
    }
    if let Some(postal_code) = address.and_then(|a| a.postal_code.as_deref()) {
        println!("Postal code: {postal_code}");
    }
    Ok(())
}
