use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::utils::{DEFAULT_MIN_CLIMATOLOGY_YEARS, DEFAULT_MIN_DAYS_PER_MONTH};

#[derive(Parser)]
#[command(name = "climate-location-etl")]
#[command(about = "Location-based climate data ETL pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        help = "SQLite database URL [default: $DATABASE_URL]"
    )]
    pub database_url: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Fetch daily observations from a GeoServer WFS endpoint
    Geoserver,
    /// Read daily observations from local CSV exports
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, validate, aggregate and store climate data for a country
    Run {
        #[arg(short, long, help = "Country whose locations to process")]
        country: String,

        #[arg(long, help = "First month of the period (YYYY-MM)")]
        start_date: String,

        #[arg(long, help = "Last month of the period (YYYY-MM)")]
        end_date: String,

        #[arg(
            short,
            long,
            value_delimiter = ',',
            conflicts_with = "all_locations",
            help = "Process only these location ids"
        )]
        location_ids: Option<Vec<i64>>,

        #[arg(
            long,
            help = "Process every registered location for the country (default when no ids are given)"
        )]
        all_locations: bool,

        #[arg(long, value_enum, default_value = "geoserver")]
        source: SourceKind,

        #[arg(long, help = "CSV file or directory (required with --source csv)")]
        csv_path: Option<PathBuf>,

        #[arg(long, help = "Recompute monthly climatology after aggregation")]
        climatology: bool,

        #[arg(
            long,
            default_value_t = DEFAULT_MIN_DAYS_PER_MONTH,
            help = "Minimum daily observations for a monthly aggregate"
        )]
        min_days: u32,

        #[arg(
            long,
            default_value_t = DEFAULT_MIN_CLIMATOLOGY_YEARS,
            help = "Minimum distinct years of history for climatology"
        )]
        min_years: usize,
    },

    /// Register a location, or update it if the id already exists
    AddLocation {
        #[arg(long)]
        id: i64,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        country: String,

        #[arg(long, help = "Identifier used by external sources for this location")]
        ext_id: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,
    },

    /// List registered locations for a country
    Locations {
        #[arg(short, long)]
        country: String,
    },
}
