/// Physical plausibility bounds for daily values, per variable (°C, mm, MJ/m²).
pub const MIN_VALID_TEMP: f64 = -50.0;
pub const MAX_VALID_TEMP: f64 = 50.0;
pub const MIN_VALID_PRECIP: f64 = 0.0;
pub const MAX_VALID_PRECIP: f64 = 1000.0;
pub const MIN_VALID_SOLAR_RAD: f64 = 0.0;
pub const MAX_VALID_SOLAR_RAD: f64 = 45.0;

/// Minimum observation days before a month is aggregated.
pub const DEFAULT_MIN_DAYS_PER_MONTH: u32 = 20;

/// Minimum distinct years of monthly history before climatology is computed.
pub const DEFAULT_MIN_CLIMATOLOGY_YEARS: usize = 2;

/// CSV daily-value file naming convention: `<variable>_daily_data.csv`.
pub const CSV_FILE_SUFFIX: &str = "_daily_data.csv";

/// GeoServer request defaults.
pub const WFS_VERSION: &str = "2.0.0";
pub const WFS_OUTPUT_FORMAT: &str = "application/json";
pub const GEOSERVER_LAYER_SUFFIX: &str = "_daily";

/// Environment variables consulted by the GeoServer source and the CLI.
pub const ENV_GEOSERVER_URL: &str = "GEOSERVER_URL";
pub const ENV_GEOSERVER_USERNAME: &str = "GEOSERVER_USERNAME";
pub const ENV_GEOSERVER_PASSWORD: &str = "GEOSERVER_PASSWORD";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
