use std::path::PathBuf;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Commands, SourceKind};
use crate::db::ClimateDb;
use crate::error::{EtlError, Result};
use crate::models::{ClimatologyNormal, Location, Observation};
use crate::processors::{ClimatologyCalculator, DataValidator, MonthlyAggregator};
use crate::sources::{CsvSource, GeoServerSource, ObservationSource};
use crate::utils::constants::ENV_DATABASE_URL;
use crate::utils::{month_span, DateRange, ProgressReporter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let database_url = resolve_database_url(cli.database_url)?;
    let db = ClimateDb::connect(&database_url).await?;

    match cli.command {
        Commands::Run {
            country,
            start_date,
            end_date,
            location_ids,
            all_locations: _,
            source,
            csv_path,
            climatology,
            min_days,
            min_years,
        } => {
            check_source_args(source, &csv_path)?;
            let range = month_span(&start_date, &end_date)?;

            println!("Processing climate data for {}", country);
            println!("Period: {}", range);

            // No id list means the whole country, whether or not
            // --all-locations was spelled out.
            let locations = match &location_ids {
                Some(ids) => db.locations_by_ids(ids, &country).await?,
                None => db.all_locations(&country).await?,
            };
            if locations.is_empty() {
                return Err(EtlError::NoLocations { country });
            }
            println!("Locations: {}", locations.len());

            let observations = match source {
                SourceKind::Geoserver => {
                    let source = GeoServerSource::from_env(&country)?;
                    fetch_observations(&source, &locations, &range).await?
                }
                SourceKind::Csv => {
                    let path = csv_path.ok_or_else(|| {
                        EtlError::Config("--csv-path is required with --source csv".to_string())
                    })?;
                    let source = CsvSource::new(path);
                    fetch_observations(&source, &locations, &range).await?
                }
            };

            let (valid, report) = DataValidator::new().validate(observations, &locations, &range);
            println!("\n{}", report.summary());

            let aggregates = MonthlyAggregator::new(min_days).aggregate(&valid);
            let stored = db.upsert_monthly(&aggregates).await?;
            println!("Stored {} monthly records", stored);

            if climatology {
                let normals = compute_climatology(&db, &locations, min_years).await?;
                let stored = db.upsert_climatology(&normals).await?;
                println!("Stored {} climatology records", stored);
            }

            println!("Processing complete!");
        }

        Commands::AddLocation {
            id,
            name,
            country,
            ext_id,
            latitude,
            longitude,
        } => {
            let location = Location::new(id, name, country, ext_id, latitude, longitude)?;
            db.insert_location(&location).await?;
            println!("Registered location {} ({})", location.id, location.name);
        }

        Commands::Locations { country } => {
            let locations = db.all_locations(&country).await?;
            if locations.is_empty() {
                println!("No locations registered for {}", country);
                return Ok(());
            }
            for location in &locations {
                println!(
                    "{:>6}  {:<30} {:>9.4} {:>9.4}  {}",
                    location.id,
                    location.name,
                    location.latitude,
                    location.longitude,
                    location.ext_id.as_deref().unwrap_or("-")
                );
            }
            println!("{} locations", locations.len());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// `--csv-path` must accompany the csv source, and only the csv source. A
/// path given alongside the geoserver source would otherwise be silently
/// ignored.
fn check_source_args(source: SourceKind, csv_path: &Option<PathBuf>) -> Result<()> {
    match (source, csv_path) {
        (SourceKind::Csv, None) => Err(EtlError::Config(
            "--csv-path is required with --source csv".to_string(),
        )),
        (SourceKind::Geoserver, Some(_)) => Err(EtlError::Config(
            "--csv-path only applies with --source csv".to_string(),
        )),
        _ => Ok(()),
    }
}

fn resolve_database_url(arg: Option<String>) -> Result<String> {
    arg.or_else(|| std::env::var(ENV_DATABASE_URL).ok())
        .ok_or_else(|| {
            EtlError::Config(format!(
                "no database configured: pass --database-url or set {}",
                ENV_DATABASE_URL
            ))
        })
}

async fn fetch_observations<S: ObservationSource>(
    source: &S,
    locations: &[Location],
    range: &DateRange,
) -> Result<Vec<Observation>> {
    println!("Fetching observations ({} source)...", source.kind());
    let observations = source.fetch(locations, range).await?;
    println!("Fetched {} observations", observations.len());
    Ok(observations)
}

/// Recompute monthly normals per location from the stored history. Locations
/// with too little history are skipped, not fatal.
async fn compute_climatology(
    db: &ClimateDb,
    locations: &[Location],
    min_years: usize,
) -> Result<Vec<ClimatologyNormal>> {
    let progress = ProgressReporter::new_spinner("Computing monthly climatology...", false);
    let calculator = ClimatologyCalculator::new(min_years);
    let mut normals = Vec::new();
    for location in locations {
        let history = db.monthly_history(location.id).await?;
        match calculator.calculate(location.id, &history) {
            Ok(location_normals) => normals.extend(location_normals),
            Err(EtlError::InsufficientHistory {
                location_id,
                years,
                required,
            }) => {
                warn!(
                    location_id,
                    years, required, "skipping climatology: not enough history"
                );
            }
            Err(e) => return Err(e),
        }
    }
    progress.finish_with_message(&format!(
        "Computed {} climatology records for {} locations",
        normals.len(),
        locations.len()
    ));
    Ok(normals)
}
