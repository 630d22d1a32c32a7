//! MSI Street Light Exposure CLI
//!
//! Lists the street lights around each location of interest, ranked by their
//! melatonin-suppression weighted contribution.
//!
//! Usage:
//!   msi-lights -i data/CorkCo.csv -l data/House_coords_BE.csv -r 150

use anyhow::{Context, Result};
use clap::Parser;
use msi_lights::report::{self, ReportFormat, SummaryReport, DEFAULT_CRS};
use msi_lights::{
    loader, DistancePolicy, LampTypeTable, LightCatalog, QueryConfig, QueryPipeline,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "msi-lights",
    about = "Location and street light MSI processing"
)]
struct Args {
    /// Street light CSV (Cork County Council layout or normalised columns)
    #[arg(short = 'i', long = "lights")]
    light_file: PathBuf,

    /// Locations of interest CSV (Eircode with IRENET95 easting/northing)
    #[arg(short = 'l', long = "locations")]
    location_file: PathBuf,

    /// Radius from each location to look for lights, in meters
    #[arg(short, long)]
    radius: Option<f64>,

    /// Drop lights whose share of the running total is at or below this value
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Floor for the light-to-location distance, in meters
    #[arg(long, conflicts_with = "reject_coincident")]
    min_distance: Option<f64>,

    /// Drop lights that coincide with a location instead of flooring the distance
    #[arg(long)]
    reject_coincident: bool,

    /// JSON query configuration (radius_m, threshold, distance_policy)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of lamp types added to (or overriding) the built-in MSI table
    #[arg(long)]
    lamp_types: Option<PathBuf>,

    /// Use only the lamp types from --lamp-types, without the built-in table
    #[arg(long, requires = "lamp_types")]
    replace_lamp_types: bool,

    /// Digits after the decimal point in the text report
    #[arg(long, default_value_t = 6)]
    precision: usize,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON summary instead of the text report
    #[arg(long)]
    json: bool,

    /// Also write GeoJSON next to the output (requires --output).
    /// An output already ending in .geojson gets a sibling <stem>.lights.geojson
    #[arg(long, requires = "output")]
    geojson: bool,

    /// Coordinate reference system recorded in the GeoJSON output
    #[arg(long, default_value = DEFAULT_CRS)]
    crs: String,

    /// Run locations in parallel
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn query_config(&self) -> Result<QueryConfig> {
        let mut config = match &self.config {
            Some(path) => QueryConfig::from_json_file(path)?,
            None => QueryConfig::default(),
        };
        if let Some(radius) = self.radius {
            config.radius_m = radius;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(min_distance_m) = self.min_distance {
            config.distance_policy = DistancePolicy::Floor { min_distance_m };
        }
        if self.reject_coincident {
            config.distance_policy = DistancePolicy::Reject;
        }
        config.validate()?;
        Ok(config)
    }

    fn lamp_type_table(&self) -> Result<LampTypeTable> {
        let table = match &self.lamp_types {
            Some(path) if self.replace_lamp_types => LampTypeTable::from_json_file(path)?,
            Some(path) => {
                let mut table = LampTypeTable::msi_defaults();
                table.extend_from_json_file(path)?;
                table
            }
            None => LampTypeTable::msi_defaults(),
        };
        Ok(table)
    }
}

/// GeoJSON path derived from the report path, never equal to it
fn geojson_path(output: &Path) -> PathBuf {
    if output.extension().is_some_and(|ext| ext == "geojson") {
        output.with_extension("lights.geojson")
    } else {
        output.with_extension("geojson")
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the report
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = args.query_config().context("invalid query configuration")?;

    let table = args.lamp_type_table().context("invalid lamp type table")?;

    let lights = loader::load_lights(&args.light_file)
        .with_context(|| format!("reading lights from {:?}", args.light_file))?;
    let catalog = LightCatalog::build(lights, &table);

    let locations = loader::load_locations(&args.location_file)
        .with_context(|| format!("reading locations from {:?}", args.location_file))?;

    let pipeline = QueryPipeline::new(&catalog, config)?;
    let reports = if args.parallel {
        pipeline.run_parallel(&locations)?
    } else {
        pipeline.run(&locations)?
    };

    let retained: usize = reports.iter().map(|r| r.retained()).sum();
    info!(
        "Ranked {} lights across {} locations",
        retained,
        reports.len()
    );

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            info!("Writing output to {:?}", path);
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = SummaryReport::new(reports, pipeline.config(), pipeline.catalog().len());
    if args.json {
        report::write_json(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        let format = ReportFormat::with_precision(args.precision);
        report::write_text_report(&mut out, &summary.locations, &format)?;
    }
    out.flush()?;

    if args.geojson {
        if let Some(output) = &args.output {
            let path = geojson_path(output);
            info!("Writing GeoJSON to {:?}", path);
            let writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(writer, &report::to_geojson(&summary, &args.crs))?;
        }
    }

    Ok(())
}
