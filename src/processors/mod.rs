pub mod aggregator;
pub mod climatology;
pub mod validator;

pub use aggregator::MonthlyAggregator;
pub use climatology::ClimatologyCalculator;
pub use validator::{CoverageGap, DataValidator, RangeViolation, ValidationReport};
