use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ClimateVariable;

/// One daily measurement for one location and variable.
///
/// Observations are ephemeral: they live in memory for a single pipeline
/// run. A missing measurement is represented by the absence of an
/// observation, never by a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub location_id: i64,
    pub variable: ClimateVariable,
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(location_id: i64, variable: ClimateVariable, date: NaiveDate, value: f64) -> Self {
        Self {
            location_id,
            variable,
            date,
            value,
        }
    }
}
