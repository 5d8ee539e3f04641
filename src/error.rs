use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("{kind} source unavailable: {reason}")]
    SourceUnavailable { kind: &'static str, reason: String },

    #[error("Source format error: {0}")]
    SourceFormat(String),

    #[error(
        "Insufficient history for location {location_id}: \
         {years} year(s) available, {required} required"
    )]
    InsufficientHistory {
        location_id: i64,
        years: usize,
        required: usize,
    },

    #[error("No locations found for country '{country}'")]
    NoLocations { country: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt stored data: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
