use chrono::{Datelike, NaiveDate};

use crate::error::{EtlError, Result};

/// Inclusive daily date range covered by one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EtlError::Config(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Expand a `YYYY-MM` to `YYYY-MM` month selection into a full daily range:
/// first day of the start month through the last day of the end month.
pub fn month_span(start_month: &str, end_month: &str) -> Result<DateRange> {
    let start = parse_month(start_month)?;
    let end_first = parse_month(end_month)?;
    let end = last_day_of_month(end_first.year(), end_first.month());
    DateRange::new(start, end)
}

fn parse_month(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    // chrono's %m accepts unpadded months, so the YYYY-MM shape is checked
    // up front.
    let well_formed = trimmed.len() == 7
        && trimmed.is_ascii()
        && trimmed.as_bytes()[4] == b'-'
        && trimmed[..4].bytes().all(|b| b.is_ascii_digit())
        && trimmed[5..].bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(EtlError::Config(format!(
            "invalid month '{}' (use YYYY-MM)",
            value
        )));
    }

    let date = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .map_err(|e| EtlError::Config(format!("invalid month '{}' (use YYYY-MM): {}", value, e)))?;
    Ok(date)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid month");
    next_month.pred_opt().expect("non-epoch date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_span_expands_to_full_months() {
        let range = month_span("2025-04", "2025-06").unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
        assert_eq!(range.num_days(), 91);
    }

    #[test]
    fn test_single_month_span() {
        let range = month_span("2024-02", "2024-02").unwrap();
        // 2024 is a leap year
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(range.num_days(), 29);
    }

    #[test]
    fn test_december_rollover() {
        let range = month_span("2023-12", "2023-12").unwrap();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(month_span("2025-06", "2025-04").is_err());
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!(month_span("2025-4", "2025-06").is_err());
        assert!(month_span("April 2025", "2025-06").is_err());
        assert!(month_span("2025-004", "2025-06").is_err());
        assert!(month_span("2025-13", "2025-13").is_err());
        assert!(month_span("2025-04-01", "2025-06").is_err());
    }

    #[test]
    fn test_contains() {
        let range = month_span("2025-04", "2025-04").unwrap();
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()));
    }
}
