use serde::{Deserialize, Serialize};

use crate::utils::constants::{
    MAX_VALID_PRECIP, MAX_VALID_SOLAR_RAD, MAX_VALID_TEMP, MIN_VALID_PRECIP, MIN_VALID_SOLAR_RAD,
    MIN_VALID_TEMP,
};

/// How daily observations collapse into a monthly value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean of the daily values (temperature, radiation).
    Mean,
    /// Accumulated total of the daily values (precipitation).
    Sum,
}

/// The enumerated set of climate variables handled by the pipeline.
///
/// Short names (`tmax`, `tmin`, `prec`, `sol_rad`) are the canonical
/// identifiers: they appear in CSV file names, GeoServer layer names and
/// the persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateVariable {
    #[serde(rename = "tmax")]
    TempMax,
    #[serde(rename = "tmin")]
    TempMin,
    #[serde(rename = "prec")]
    Precipitation,
    #[serde(rename = "sol_rad")]
    SolarRadiation,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 4] = [
        ClimateVariable::TempMax,
        ClimateVariable::TempMin,
        ClimateVariable::Precipitation,
        ClimateVariable::SolarRadiation,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            ClimateVariable::TempMax => "tmax",
            ClimateVariable::TempMin => "tmin",
            ClimateVariable::Precipitation => "prec",
            ClimateVariable::SolarRadiation => "sol_rad",
        }
    }

    /// Resolve a variable from its short name or a documented alias.
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "tmax" | "temperature_max" => Some(ClimateVariable::TempMax),
            "tmin" | "temperature_min" => Some(ClimateVariable::TempMin),
            "prec" | "precipitation" => Some(ClimateVariable::Precipitation),
            "sol_rad" | "solar_radiation" => Some(ClimateVariable::SolarRadiation),
            _ => None,
        }
    }

    /// Precipitation accumulates; everything else averages.
    pub fn reducer(&self) -> Reducer {
        match self {
            ClimateVariable::Precipitation => Reducer::Sum,
            _ => Reducer::Mean,
        }
    }

    /// Physical plausibility bounds for a single daily value.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            ClimateVariable::TempMax | ClimateVariable::TempMin => (MIN_VALID_TEMP, MAX_VALID_TEMP),
            ClimateVariable::Precipitation => (MIN_VALID_PRECIP, MAX_VALID_PRECIP),
            ClimateVariable::SolarRadiation => (MIN_VALID_SOLAR_RAD, MAX_VALID_SOLAR_RAD),
        }
    }

    pub fn in_bounds(&self, value: f64) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&value)
    }
}

impl std::fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}
