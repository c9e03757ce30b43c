use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::ServiceArgs;

/// Offline reverse geocoding CLI tool
#[derive(Parser)]
#[command(name = "rgeo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing <COUNTRY>.csv reference files
    #[arg(short, long, env = "RGEO_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Number of neighboring keys examined per lookup
    #[arg(
        short,
        long,
        env = "RGEO_WINDOW_SIZE",
        default_value = "10",
        global = true
    )]
    window_size: usize,

    /// Maximum match distance in km ("none" or "off" to disable)
    #[arg(short, long, env = "RGEO_MAX_DISTANCE_KM", global = true)]
    max_distance: Option<String>,

    /// Accept the nearest candidate regardless of distance
    #[arg(long, global = true)]
    no_threshold: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the place nearest to a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Reverse geocode multiple coordinates from a file
    Batch {
        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (same format as input if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display information about the loaded data, or how a coordinate is searched
    Info {
        /// Latitude of a coordinate to explain
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude of a coordinate to explain
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List available reference files
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = ServiceArgs {
        data_dir: cli.data_dir,
        window_size: cli.window_size,
        max_distance: cli.max_distance,
        no_threshold: cli.no_threshold,
    };

    match cli.command {
        Commands::Query { lat, lon, json } => commands::query::run(&args, lat, lon, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(&args, input, output, lat_col, lon_col),
        Commands::Info { lat, lon } => commands::info::run(&args, lat, lon),
        Commands::List => commands::list::run(&args),
    }
}
