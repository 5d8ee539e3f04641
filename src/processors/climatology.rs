use std::collections::{BTreeMap, HashSet};

use tracing::info;

use crate::error::{EtlError, Result};
use crate::models::{ClimatologyNormal, MonthlyAggregate};

/// Computes long-run monthly climatological normals.
///
/// Works over the full monthly history available for a location (no
/// reference period): for each (variable, month) the normal is the mean of
/// that month's aggregates across years. History shorter than `min_years`
/// distinct years yields `InsufficientHistory`.
pub struct ClimatologyCalculator {
    min_years: usize,
}

impl ClimatologyCalculator {
    pub fn new(min_years: usize) -> Self {
        Self {
            min_years: min_years.max(1),
        }
    }

    pub fn calculate(
        &self,
        location_id: i64,
        history: &[MonthlyAggregate],
    ) -> Result<Vec<ClimatologyNormal>> {
        let years: HashSet<i32> = history.iter().map(|a| a.year).collect();
        if years.len() < self.min_years {
            return Err(EtlError::InsufficientHistory {
                location_id,
                years: years.len(),
                required: self.min_years,
            });
        }

        // BTreeMap keeps the output ordered by (variable, month).
        let mut groups: BTreeMap<(&'static str, u32), Vec<&MonthlyAggregate>> = BTreeMap::new();
        for aggregate in history {
            groups
                .entry((aggregate.variable.short_name(), aggregate.month))
                .or_default()
                .push(aggregate);
        }

        let mut normals = Vec::with_capacity(groups.len());
        for ((_, month), aggregates) in groups {
            let year_span = aggregates
                .iter()
                .map(|a| a.year)
                .collect::<HashSet<_>>()
                .len() as u32;
            let mean =
                aggregates.iter().map(|a| a.value).sum::<f64>() / aggregates.len() as f64;

            normals.push(ClimatologyNormal {
                location_id,
                variable: aggregates[0].variable,
                month,
                value: round2(mean),
                year_span,
            });
        }

        info!(
            location_id,
            records = normals.len(),
            years = years.len(),
            "monthly climatology calculated"
        );
        Ok(normals)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
