use serde::{Deserialize, Serialize};

use crate::models::ClimateVariable;

/// A single monthly summary value for one location and variable.
///
/// Invariant: `source_count >= 1`. Aggregates are never produced from an
/// empty observation set; months that fail the minimum-day threshold are
/// omitted entirely rather than emitted with a degraded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub location_id: i64,
    pub variable: ClimateVariable,
    pub year: i32,
    pub month: u32,
    pub value: f64,
    pub source_count: u32,
}

/// Long-run monthly climatological normal for one location and variable.
///
/// `month` is a calendar month index (1-12); `year_span` records how many
/// distinct years of monthly aggregates contributed to the mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatologyNormal {
    pub location_id: i64,
    pub variable: ClimateVariable,
    pub month: u32,
    pub value: f64,
    pub year_span: u32,
}
