use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::models::{ClimateVariable, Location, Observation};
use crate::utils::DateRange;

/// A daily value that fell outside its variable's physical bounds.
#[derive(Debug, Clone)]
pub struct RangeViolation {
    pub location_id: i64,
    pub variable: ClimateVariable,
    pub date: NaiveDate,
    pub value: f64,
    pub bounds: (f64, f64),
}

/// Missing date coverage for one (location, variable) over the run's range.
#[derive(Debug, Clone)]
pub struct CoverageGap {
    pub location_id: i64,
    pub variable: ClimateVariable,
    pub observed_days: usize,
    pub expected_days: usize,
}

impl CoverageGap {
    pub fn missing_days(&self) -> usize {
        self.expected_days.saturating_sub(self.observed_days)
    }

    pub fn coverage_pct(&self) -> f64 {
        if self.expected_days == 0 {
            return 100.0;
        }
        100.0 * self.observed_days as f64 / self.expected_days as f64
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_records: usize,
    pub violations: Vec<RangeViolation>,
    pub gaps: Vec<CoverageGap>,
}

impl ValidationReport {
    pub fn dropped_records(&self) -> usize {
        self.violations.len()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Validation Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", self.total_records));
        let pct = if self.total_records > 0 {
            100.0 * self.valid_records as f64 / self.total_records as f64
        } else {
            0.0
        };
        summary.push_str(&format!(
            "Valid Records: {} ({:.1}%)\n",
            self.valid_records, pct
        ));
        summary.push_str(&format!(
            "Dropped (out of range): {}\n",
            self.dropped_records()
        ));
        summary.push_str(&format!("Coverage Gaps: {}\n", self.gaps.len()));

        if !self.violations.is_empty() {
            summary.push_str("\nTop 10 Range Violations:\n");
            for (i, v) in self.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Location {} {} on {}: {} outside [{}, {}]\n",
                    i + 1,
                    v.location_id,
                    v.variable,
                    v.date,
                    v.value,
                    v.bounds.0,
                    v.bounds.1
                ));
            }
        }

        if !self.gaps.is_empty() {
            summary.push_str("\nTop 10 Coverage Gaps:\n");
            for (i, gap) in self.gaps.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Location {} {}: {}/{} days ({:.1}% coverage)\n",
                    i + 1,
                    gap.location_id,
                    gap.variable,
                    gap.observed_days,
                    gap.expected_days,
                    gap.coverage_pct()
                ));
            }
        }

        summary
    }
}

/// Checks fetched observations for plausible values and date coverage.
///
/// Policy is "skip and log": out-of-range values are dropped and recorded
/// as violations, coverage gaps are reported as warnings. Neither halts the
/// pipeline.
pub struct DataValidator;

impl DataValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        observations: Vec<Observation>,
        locations: &[Location],
        range: &DateRange,
    ) -> (Vec<Observation>, ValidationReport) {
        let mut report = ValidationReport {
            total_records: observations.len(),
            ..Default::default()
        };

        let mut kept = Vec::with_capacity(observations.len());
        for observation in observations {
            if observation.variable.in_bounds(observation.value) {
                kept.push(observation);
            } else {
                report.violations.push(RangeViolation {
                    location_id: observation.location_id,
                    variable: observation.variable,
                    date: observation.date,
                    value: observation.value,
                    bounds: observation.variable.bounds(),
                });
            }
        }
        report.valid_records = kept.len();

        report.gaps = self.find_gaps(&kept, locations, range);

        for violation in &report.violations {
            warn!(
                location_id = violation.location_id,
                variable = %violation.variable,
                date = %violation.date,
                value = violation.value,
                "dropped out-of-range observation"
            );
        }
        for gap in &report.gaps {
            warn!(
                location_id = gap.location_id,
                variable = %gap.variable,
                missing_days = gap.missing_days(),
                "incomplete date coverage"
            );
        }
        info!(
            total = report.total_records,
            valid = report.valid_records,
            dropped = report.dropped_records(),
            gaps = report.gaps.len(),
            "data validation completed"
        );

        (kept, report)
    }

    /// Report date-coverage gaps per (location, variable). Only variables
    /// that appear somewhere in the observation set are expected; a source
    /// that never carries solar radiation should not flag every location
    /// for it.
    fn find_gaps(
        &self,
        observations: &[Observation],
        locations: &[Location],
        range: &DateRange,
    ) -> Vec<CoverageGap> {
        let expected_days = range.num_days() as usize;

        let present_variables: HashSet<ClimateVariable> =
            observations.iter().map(|o| o.variable).collect();

        let mut dates_by_key: HashMap<(i64, ClimateVariable), HashSet<NaiveDate>> = HashMap::new();
        for observation in observations {
            dates_by_key
                .entry((observation.location_id, observation.variable))
                .or_default()
                .insert(observation.date);
        }

        let mut gaps = Vec::new();
        for location in locations {
            for variable in &present_variables {
                let observed_days = dates_by_key
                    .get(&(location.id, *variable))
                    .map(|dates| dates.len())
                    .unwrap_or(0);
                if observed_days < expected_days {
                    gaps.push(CoverageGap {
                        location_id: location.id,
                        variable: *variable,
                        observed_days,
                        expected_days,
                    });
                }
            }
        }
        gaps.sort_by_key(|g| (g.location_id, g.variable.short_name()));
        gaps
    }
}

impl Default for DataValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::month_span;
    use chrono::Days;

    fn location(id: i64) -> Location {
        Location::new(
            id,
            format!("Location {}", id),
            "HONDURAS".to_string(),
            None,
            14.0,
            -87.0,
        )
        .unwrap()
    }

    fn daily_observations(
        location_id: i64,
        variable: ClimateVariable,
        range: &DateRange,
        value: f64,
    ) -> Vec<Observation> {
        let mut observations = Vec::new();
        let mut date = range.start;
        while date <= range.end {
            observations.push(Observation::new(location_id, variable, date, value));
            date = date + Days::new(1);
        }
        observations
    }

    #[test]
    fn test_out_of_range_values_dropped_not_fatal() {
        let range = month_span("2025-04", "2025-04").unwrap();
        let mut observations =
            daily_observations(1, ClimateVariable::Precipitation, &range, 10.0);
        observations[0].value = -5.0; // below physical minimum

        let (kept, report) =
            DataValidator::new().validate(observations, &[location(1)], &range);

        assert_eq!(report.total_records, 30);
        assert_eq!(kept.len(), 29);
        assert_eq!(report.dropped_records(), 1);
        assert_eq!(report.violations[0].value, -5.0);
    }

    #[test]
    fn test_gap_reported_for_missing_days() {
        let range = month_span("2025-04", "2025-04").unwrap();
        let mut observations = daily_observations(1, ClimateVariable::TempMax, &range, 30.0);
        observations.truncate(25); // drop the last five days

        let (_, report) = DataValidator::new().validate(observations, &[location(1)], &range);

        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].missing_days(), 5);
        assert_eq!(report.gaps[0].observed_days, 25);
    }

    #[test]
    fn test_full_coverage_produces_no_gaps() {
        let range = month_span("2025-04", "2025-04").unwrap();
        let observations = daily_observations(1, ClimateVariable::TempMax, &range, 30.0);

        let (kept, report) = DataValidator::new().validate(observations, &[location(1)], &range);

        assert_eq!(kept.len(), 30);
        assert!(report.gaps.is_empty());
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_absent_variable_not_expected() {
        // Only precipitation appears in the data; solar radiation should not
        // be flagged as a gap for any location.
        let range = month_span("2025-04", "2025-04").unwrap();
        let observations =
            daily_observations(1, ClimateVariable::Precipitation, &range, 2.0);

        let (_, report) = DataValidator::new().validate(
            observations,
            &[location(1), location(2)],
            &range,
        );

        // Location 2 has no precipitation at all: one gap, for prec only.
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].location_id, 2);
        assert_eq!(report.gaps[0].observed_days, 0);
    }

    #[test]
    fn test_summary_renders() {
        let range = month_span("2025-04", "2025-04").unwrap();
        let observations = daily_observations(1, ClimateVariable::TempMin, &range, 18.0);
        let (_, report) = DataValidator::new().validate(observations, &[location(1)], &range);

        let summary = report.summary();
        assert!(summary.contains("Total Records: 30"));
        assert!(summary.contains("Valid Records: 30 (100.0%)"));
    }
}
