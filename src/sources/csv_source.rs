use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EtlError, Result};
use crate::models::{ClimateVariable, Location, Observation};
use crate::sources::ObservationSource;
use crate::utils::constants::CSV_FILE_SUFFIX;
use crate::utils::DateRange;

/// Reads daily observations from `<variable>_daily_data.csv` files.
///
/// The path may be a directory (all matching files are processed) or a
/// single CSV file. Rows carry either a registry `id` or an `ext_id`
/// resolved through the location registry; rows that resolve to no known
/// location are skipped and logged.
pub struct CsvSource {
    path: PathBuf,
}

/// Row schema: `ext_id|id, day, month, year, value`. An empty `value` cell
/// means the measurement is missing and produces no observation.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    ext_id: Option<String>,
    day: u32,
    month: u32,
    year: i32,
    #[serde(default)]
    value: Option<f64>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the daily-value files to process and the variable each carries.
    fn discover_files(&self) -> Result<Vec<(PathBuf, ClimateVariable)>> {
        if self.path.is_file() {
            let variable = variable_from_filename(&self.path).ok_or_else(|| {
                EtlError::SourceFormat(format!(
                    "cannot determine climate variable from file name '{}'",
                    self.path.display()
                ))
            })?;
            return Ok(vec![(self.path.clone(), variable)]);
        }

        if !self.path.is_dir() {
            return Err(EtlError::SourceUnavailable {
                kind: "csv",
                reason: format!("path '{}' does not exist", self.path.display()),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if !name.ends_with(CSV_FILE_SUFFIX) {
                continue;
            }
            match variable_from_filename(&path) {
                Some(variable) => files.push((path, variable)),
                None => warn!(file = %name, "skipping CSV with unknown variable prefix"),
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        if files.is_empty() {
            return Err(EtlError::SourceUnavailable {
                kind: "csv",
                reason: format!(
                    "no *{} files found in '{}'",
                    CSV_FILE_SUFFIX,
                    self.path.display()
                ),
            });
        }

        Ok(files)
    }

    fn read_file(
        &self,
        path: &Path,
        variable: ClimateVariable,
        id_set: &HashSet<i64>,
        ext_map: &HashMap<String, i64>,
        range: &DateRange,
    ) -> Result<Vec<Observation>> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        check_headers(reader.headers()?, &file_name)?;

        let mut observations = Vec::new();
        let mut rows_read = 0usize;
        let mut unresolved = 0usize;
        let mut missing_values = 0usize;

        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| {
                EtlError::SourceFormat(format!("malformed row in '{}': {}", file_name, e))
            })?;
            rows_read += 1;

            let date = NaiveDate::from_ymd_opt(row.year, row.month, row.day).ok_or_else(|| {
                EtlError::SourceFormat(format!(
                    "invalid calendar date {}-{:02}-{:02} in '{}'",
                    row.year, row.month, row.day, file_name
                ))
            })?;

            if !range.contains(date) {
                continue;
            }

            let value = match row.value {
                Some(value) => value,
                None => {
                    missing_values += 1;
                    continue;
                }
            };

            let location_id = match resolve_identity(&row, id_set, ext_map) {
                Some(id) => id,
                None => {
                    unresolved += 1;
                    continue;
                }
            };

            observations.push(Observation::new(location_id, variable, date, value));
        }

        if unresolved > 0 {
            warn!(
                file = %file_name,
                unresolved, "rows with no matching registry location were skipped"
            );
        }
        debug!(
            file = %file_name,
            rows_read,
            emitted = observations.len(),
            missing_values,
            "finished reading CSV file"
        );

        Ok(observations)
    }
}

impl ObservationSource for CsvSource {
    fn kind(&self) -> &'static str {
        "csv"
    }

    async fn fetch(&self, locations: &[Location], range: &DateRange) -> Result<Vec<Observation>> {
        let files = self.discover_files()?;
        info!(
            files = files.len(),
            path = %self.path.display(),
            "starting CSV data extraction"
        );

        let id_set: HashSet<i64> = locations.iter().map(|l| l.id).collect();
        let ext_map: HashMap<String, i64> = locations
            .iter()
            .filter_map(|l| l.ext_id.clone().map(|ext| (ext, l.id)))
            .collect();

        let mut observations = Vec::new();
        for (path, variable) in &files {
            info!(file = %path.display(), variable = %variable, "reading CSV file");
            observations.extend(self.read_file(path, *variable, &id_set, &ext_map, range)?);
        }

        info!(
            total = observations.len(),
            "CSV data extraction completed"
        );
        Ok(observations)
    }
}

/// Extract the variable short name from `<variable>_daily_data.csv`.
fn variable_from_filename(path: &Path) -> Option<ClimateVariable> {
    let stem = path.file_stem()?.to_str()?;
    let prefix = stem.strip_suffix("_daily_data").unwrap_or(stem);
    ClimateVariable::from_short_name(prefix)
}

fn check_headers(headers: &csv::StringRecord, file_name: &str) -> Result<()> {
    let names: HashSet<&str> = headers.iter().map(|h| h.trim()).collect();

    if !names.contains("id") && !names.contains("ext_id") {
        return Err(EtlError::SourceFormat(format!(
            "'{}' must contain either an 'id' or an 'ext_id' column",
            file_name
        )));
    }

    let missing: Vec<&str> = ["day", "month", "year", "value"]
        .into_iter()
        .filter(|col| !names.contains(col))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::SourceFormat(format!(
            "'{}' is missing required columns: {}",
            file_name,
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Prefer a direct registry `id` match; fall back to the `ext_id` mapping.
fn resolve_identity(
    row: &CsvRow,
    id_set: &HashSet<i64>,
    ext_map: &HashMap<String, i64>,
) -> Option<i64> {
    if let Some(id) = row.id {
        if id_set.contains(&id) {
            return Some(id);
        }
    }
    if let Some(ext_id) = &row.ext_id {
        if let Some(id) = ext_map.get(ext_id) {
            return Some(*id);
        }
    }
    None
}
