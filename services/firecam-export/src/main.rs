//! Fire-emission table exporter.
//!
//! Resolves a region, runs one emissions request against the configured
//! inventory collections and writes the resulting tables as CSV:
//! - `compare`: annual and monthly tables across inventories
//! - `land-cover`: GFED emissions by land-cover category
//! - `daily`: GFED daily series for one year
//! - `ef-compare`: GFED with current and updated emission factors
//! - `composition`: land-cover class shares of a region
//! - `regions`: list the selectable regions

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use emissions::{
    EmissionsConfig, EmissionsPipeline, EmissionsRequest, Inventory, Reducer, Statistic, Weighting,
};
use fire_common::{Species, TimeResolution, YearRange};
use raster::RasterConfig;
use regions::Region;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "firecam-export")]
#[command(about = "Export harmonized fire-emission tables for a region")]
struct Args {
    /// YAML configuration file (defaults plus FIRECAM_* variables if omitted)
    #[arg(short, long, env = "FIRECAM_CONFIG")]
    config: Option<PathBuf>,

    /// Directory receiving the CSV files
    #[arg(short, long, env = "FIRECAM_OUTPUT_DIR", default_value = "exports")]
    output_dir: PathBuf,

    /// Print tables to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Resolution {
    Annual,
    Monthly,
}

impl From<Resolution> for TimeResolution {
    fn from(value: Resolution) -> Self {
        match value {
            Resolution::Annual => TimeResolution::Annual,
            Resolution::Monthly => TimeResolution::Monthly,
        }
    }
}

/// Options shared by every request.
#[derive(clap::Args, Debug, Clone)]
struct RequestArgs {
    /// Species tag, e.g. CO2, PM2.5 or BA
    #[arg(short, long)]
    species: Species,

    /// Year range, e.g. 2010-2012 or 2015
    #[arg(short, long)]
    years: YearRange,

    /// Region: global, basis:EQAS, country:Bahamas, point:lon,lat,
    /// polygon:lon,lat;lon,lat;... or bbox:minx,miny,maxx,maxy
    #[arg(short, long, default_value = "global")]
    region: Region,

    /// Regional statistic (defaults to the configured one)
    #[arg(long)]
    statistic: Option<Statistic>,

    /// Cell weighting (defaults to the configured one)
    #[arg(long)]
    weighting: Option<Weighting>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annual and monthly tables across inventories
    Compare {
        #[command(flatten)]
        request: RequestArgs,

        /// Inventories to include, by id or label (default: all)
        #[arg(short, long, value_delimiter = ',')]
        inventory: Vec<Inventory>,
    },

    /// GFED emissions by land-cover category
    LandCover {
        #[command(flatten)]
        request: RequestArgs,

        #[arg(long, value_enum, default_value = "annual")]
        resolution: Resolution,
    },

    /// GFED daily series for one year
    Daily {
        #[arg(short, long)]
        species: Species,

        #[arg(short, long)]
        year: i32,

        #[arg(short, long, default_value = "global")]
        region: Region,
    },

    /// GFED emissions with current and updated emission factors
    EfCompare {
        #[command(flatten)]
        request: RequestArgs,

        #[arg(long, value_enum, default_value = "annual")]
        resolution: Resolution,
    },

    /// Land-cover class shares of a region
    Composition {
        #[arg(short, long)]
        years: YearRange,

        #[arg(short, long, default_value = "global")]
        region: Region,
    },

    /// List basis regions and loaded countries
    Regions,
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // logs go to stderr so --stdout output stays clean
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let config = EmissionsConfig::load(args.config.as_deref()).context("loading configuration")?;
    info!(
        data_dir = %config.data_dir.display(),
        reference_dir = %config.reference_dir.display(),
        "Loaded configuration"
    );

    let pipeline = tokio::task::spawn_blocking(move || {
        EmissionsPipeline::from_config(config, RasterConfig::from_env())
    })
    .await?
    .context("initializing emissions pipeline")?;
    let pipeline = Arc::new(pipeline);

    let output = if args.stdout {
        commands::Output::Stdout
    } else {
        commands::Output::Dir(args.output_dir.clone())
    };

    match args.command {
        Command::Compare { request, inventory } => {
            let mut request = request.into_request(&pipeline);
            if !inventory.is_empty() {
                request = request.with_inventories(inventory);
            }
            commands::compare(pipeline.clone(), request, &output).await?;
        }
        Command::LandCover { request, resolution } => {
            commands::land_cover(pipeline.clone(), request.into_request(&pipeline), resolution.into(), &output).await?;
        }
        Command::Daily { species, year, region } => {
            commands::daily(pipeline.clone(), species, year, region, &output).await?;
        }
        Command::EfCompare { request, resolution } => {
            commands::ef_compare(pipeline.clone(), request.into_request(&pipeline), resolution.into(), &output).await?;
        }
        Command::Composition { years, region } => {
            commands::composition(pipeline.clone(), years, region).await?;
        }
        Command::Regions => commands::list_regions(&pipeline),
    }

    let stats = pipeline.cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        entries = stats.entries,
        "Series cache"
    );
    Ok(())
}

impl RequestArgs {
    /// Request with reducer overrides layered over the configured reducer.
    fn into_request(self, pipeline: &EmissionsPipeline) -> EmissionsRequest {
        let defaults = pipeline.config().reducer;
        let mut request = EmissionsRequest::new(self.species, self.years, self.region);
        if self.statistic.is_some() || self.weighting.is_some() {
            request = request.with_reducer(Reducer::new(
                self.statistic.unwrap_or(defaults.statistic),
                self.weighting.unwrap_or(defaults.weighting),
            ));
        }
        request
    }
}
