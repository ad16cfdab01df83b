//! Hospital access report.
//!
//! Loads the hospital registry and the boundary layers, runs every dashboard
//! section and writes a JSON report (plus optional GeoJSON map layers).

mod export;

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hospaccess::config::Config;
use hospaccess::loader::{FeatureLayer, HospitalRegistry};
use hospaccess::models::{AccessReport, SectionReport};
use hospaccess::sections;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "hospaccess")]
#[command(about = "Analyse hospital access by district, department and settlement")]
struct Args {
    /// TOML configuration file (optional, defaults reproduce the dashboard)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hospital registry CSV (overrides config)
    #[arg(long)]
    hospitals: Option<PathBuf>,

    /// District boundary layer, .shp or .geojson (overrides config)
    #[arg(long)]
    districts: Option<PathBuf>,

    /// Populated-center layer, .shp or .geojson (overrides config)
    #[arg(long)]
    settlements: Option<PathBuf>,

    /// Buffer radius in meters (overrides config)
    #[arg(long)]
    radius: Option<f64>,

    /// Regions for the proximity section, comma separated (overrides config)
    #[arg(long, value_delimiter = ',')]
    regions: Option<Vec<String>>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export districts.geojson and hospitals.geojson into this directory
    #[arg(long)]
    geojson_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config(&args)?;

    info!("Hospital access report");
    info!("Hospitals: {}", config.input.hospitals.display());
    info!("Districts: {}", config.input.districts.display());
    info!("Settlements: {}", config.input.settlements.display());

    let start = Instant::now();

    let registry = HospitalRegistry::open(
        &config.input.hospitals,
        config.input.encoding,
        config.input.delimiter,
    )
    .context("Failed to load hospital registry")?;
    let districts_layer = FeatureLayer::open(&config.input.districts, config.input.layer_encoding)
        .context("Failed to load district layer")?;
    let settlements_layer =
        FeatureLayer::open(&config.input.settlements, config.input.layer_encoding)
            .context("Failed to load populated-center layer")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));

    pb.set_message("Hospitals per district");
    let districts = SectionReport::from_result(
        sections::districts(&registry, &districts_layer, &config, &config.status.districts)
            .map(|analysis| analysis.summary),
    );
    log_section("districts", &districts);

    pb.set_message("Hospitals per department");
    let departments = SectionReport::from_result(sections::departments(&registry, &config));
    log_section("departments", &departments);

    pb.set_message("Settlement proximity");
    let proximity = SectionReport::from_result(sections::proximity(
        &registry,
        &settlements_layer,
        &config,
    ));
    log_section("proximity", &proximity);

    pb.set_message("National map");
    let national_map = match sections::national_map(&registry, &districts_layer, &config) {
        Ok(analysis) => {
            if let Some(dir) = &args.geojson_dir {
                export::export_map_layers(dir, &analysis.units, &analysis.hospitals);
            }
            SectionReport::Complete {
                data: analysis.summary,
            }
        }
        Err(e) => SectionReport::from_result(Err(e)),
    };
    log_section("national_map", &national_map);

    pb.finish_and_clear();

    let report = AccessReport {
        generated_at: Utc::now(),
        radius_m: config.proximity.radius_m,
        projection: config.proximity.projection.to_string(),
        districts,
        departments,
        proximity,
        national_map,
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

/// Config file (if any) with CLI overrides applied
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    if let Some(path) = &args.hospitals {
        config.input.hospitals = path.clone();
    }
    if let Some(path) = &args.districts {
        config.input.districts = path.clone();
    }
    if let Some(path) = &args.settlements {
        config.input.settlements = path.clone();
    }
    if let Some(radius) = args.radius {
        if !(radius.is_finite() && radius > 0.0) {
            anyhow::bail!("--radius must be a positive number of meters, got {}", radius);
        }
        config.proximity.radius_m = radius;
    }
    if let Some(regions) = &args.regions {
        config.proximity.regions = regions.iter().map(|r| r.trim().to_string()).collect();
    }

    Ok(config)
}

fn log_section<T>(name: &str, report: &SectionReport<T>) {
    match report {
        SectionReport::Complete { .. } => info!("Section {} complete", name),
        SectionReport::Empty { warning } => warn!("Section {} is empty: {}", name, warning),
        SectionReport::Skipped { reason } => error!("Section {} skipped: {}", name, reason),
    }
}
