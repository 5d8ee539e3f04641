use std::collections::HashMap;

use chrono::Datelike;
use tracing::{debug, info};

use crate::models::{MonthlyAggregate, Observation, Reducer};

/// Reduces daily observations to monthly summaries.
///
/// Observations are grouped by (location, variable, year, month) and
/// collapsed with the variable's reducer: sum for precipitation, mean for
/// temperature and radiation. Months with fewer than `min_days`
/// observations are omitted rather than emitted with a degraded value.
pub struct MonthlyAggregator {
    min_days: u32,
}

impl MonthlyAggregator {
    pub fn new(min_days: u32) -> Self {
        // A zero threshold would permit aggregates from no observations,
        // which violates the source_count >= 1 invariant.
        Self {
            min_days: min_days.max(1),
        }
    }

    pub fn aggregate(&self, observations: &[Observation]) -> Vec<MonthlyAggregate> {
        let mut groups: HashMap<(i64, crate::models::ClimateVariable, i32, u32), Vec<f64>> =
            HashMap::new();
        for observation in observations {
            groups
                .entry((
                    observation.location_id,
                    observation.variable,
                    observation.date.year(),
                    observation.date.month(),
                ))
                .or_default()
                .push(observation.value);
        }

        let mut aggregates = Vec::new();
        let mut omitted = 0usize;
        for ((location_id, variable, year, month), values) in groups {
            let source_count = values.len() as u32;
            if source_count < self.min_days {
                debug!(
                    location_id,
                    variable = %variable,
                    year,
                    month,
                    days = source_count,
                    min_days = self.min_days,
                    "month omitted: below minimum day count"
                );
                omitted += 1;
                continue;
            }

            let total: f64 = values.iter().sum();
            let value = match variable.reducer() {
                Reducer::Sum => total,
                Reducer::Mean => total / values.len() as f64,
            };

            aggregates.push(MonthlyAggregate {
                location_id,
                variable,
                year,
                month,
                value: round2(value),
                source_count,
            });
        }

        aggregates.sort_by(|a, b| {
            (a.location_id, a.variable.short_name(), a.year, a.month).cmp(&(
                b.location_id,
                b.variable.short_name(),
                b.year,
                b.month,
            ))
        });

        info!(
            monthly_records = aggregates.len(),
            omitted, "monthly aggregation completed"
        );
        aggregates
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClimateVariable;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn month_of_observations(
        location_id: i64,
        variable: ClimateVariable,
        year: i32,
        month: u32,
        days: u32,
        value: f64,
    ) -> Vec<Observation> {
        (1..=days)
            .map(|day| {
                Observation::new(
                    location_id,
                    variable,
                    NaiveDate::from_ymd_opt(year, month, day).unwrap(),
                    value,
                )
            })
            .collect()
    }

    #[test]
    fn test_precipitation_sums() {
        let observations =
            month_of_observations(1, ClimateVariable::Precipitation, 2025, 4, 30, 2.5);

        let aggregates = MonthlyAggregator::new(20).aggregate(&observations);

        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].value, 75.0);
        assert_eq!(aggregates[0].source_count, 30);
        assert_eq!(aggregates[0].year, 2025);
        assert_eq!(aggregates[0].month, 4);
    }

    #[test]
    fn test_temperature_averages() {
        let mut observations = month_of_observations(1, ClimateVariable::TempMax, 2025, 4, 15, 30.0);
        observations.extend(month_of_observations(1, ClimateVariable::TempMax, 2025, 4, 15, 32.0).into_iter().map(|mut o| {
            // Shift to the second half of the month so dates stay distinct.
            o.date = o.date + chrono::Days::new(15);
            o
        }));

        let aggregates = MonthlyAggregator::new(20).aggregate(&observations);

        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].value, 31.0);
        assert_eq!(aggregates[0].source_count, 30);
    }

    #[test]
    fn test_month_below_threshold_omitted() {
        let observations =
            month_of_observations(1, ClimateVariable::Precipitation, 2025, 4, 12, 1.0);

        let aggregates = MonthlyAggregator::new(20).aggregate(&observations);

        assert!(aggregates.is_empty());
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let mut observations =
            month_of_observations(1, ClimateVariable::Precipitation, 2025, 4, 30, 1.25);
        observations.extend(month_of_observations(
            2,
            ClimateVariable::TempMin,
            2025,
            4,
            25,
            17.3,
        ));

        let aggregator = MonthlyAggregator::new(20);
        let first = aggregator.aggregate(&observations);
        let second = aggregator.aggregate(&observations);

        assert_eq!(first, second);
    }

    #[test]
    fn test_groups_split_by_month_and_location() {
        let mut observations =
            month_of_observations(1, ClimateVariable::Precipitation, 2025, 4, 30, 1.0);
        observations.extend(month_of_observations(
            1,
            ClimateVariable::Precipitation,
            2025,
            5,
            31,
            2.0,
        ));
        observations.extend(month_of_observations(
            2,
            ClimateVariable::Precipitation,
            2025,
            4,
            30,
            3.0,
        ));

        let aggregates = MonthlyAggregator::new(20).aggregate(&observations);

        assert_eq!(aggregates.len(), 3);
        // Sorted by (location, variable, year, month).
        assert_eq!((aggregates[0].location_id, aggregates[0].month), (1, 4));
        assert_eq!((aggregates[1].location_id, aggregates[1].month), (1, 5));
        assert_eq!((aggregates[2].location_id, aggregates[2].month), (2, 4));
        assert_eq!(aggregates[1].value, 62.0);
    }

    #[test]
    fn test_values_rounded_to_two_decimals() {
        let observations = vec![
            Observation::new(
                1,
                ClimateVariable::TempMax,
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                30.111,
            ),
            Observation::new(
                1,
                ClimateVariable::TempMax,
                NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
                30.222,
            ),
            Observation::new(
                1,
                ClimateVariable::TempMax,
                NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
                30.333,
            ),
        ];

        let aggregates = MonthlyAggregator::new(1).aggregate(&observations);

        assert_eq!(aggregates[0].value, 30.22);
    }

    #[test]
    fn test_zero_threshold_clamped_to_one() {
        let aggregator = MonthlyAggregator::new(0);
        let aggregates = aggregator.aggregate(&[]);
        assert!(aggregates.is_empty());
    }
}
