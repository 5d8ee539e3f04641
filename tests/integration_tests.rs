use std::fs;
use std::path::Path;

use chrono::Datelike;
use climate_location_etl::db::ClimateDb;
use climate_location_etl::models::{ClimateVariable, Location};
use climate_location_etl::processors::{ClimatologyCalculator, DataValidator, MonthlyAggregator};
use climate_location_etl::sources::{CsvSource, ObservationSource};
use climate_location_etl::utils::month_span;
use tempfile::TempDir;

fn write_daily_csv(dir: &Path, variable: &str, ext_id: &str, year: i32, months: &[(u32, u32, f64)]) {
    let mut body = String::from("ext_id,day,month,year,value\n");
    for &(month, days, value) in months {
        for day in 1..=days {
            body.push_str(&format!("{},{},{},{},{}\n", ext_id, day, month, year, value));
        }
    }
    fs::write(dir.join(format!("{}_daily_data.csv", variable)), body).unwrap();
}

async fn test_db(dir: &TempDir) -> ClimateDb {
    let url = format!("sqlite://{}", dir.path().join("climate.db").display());
    ClimateDb::connect(&url).await.unwrap()
}

fn honduras_location(id: i64, ext_id: &str) -> Location {
    Location::new(
        id,
        format!("Station {}", id),
        "HONDURAS".to_string(),
        Some(ext_id.to_string()),
        14.08,
        -87.21,
    )
    .unwrap()
}

#[tokio::test]
async fn test_csv_pipeline_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();

    // April 2025: 30 days of precipitation at 2.5 mm, 30 days of tmax at 31 C.
    write_daily_csv(&data_dir, "prec", "HND001", 2025, &[(4, 30, 2.5)]);
    write_daily_csv(&data_dir, "tmax", "HND001", 2025, &[(4, 30, 31.0)]);

    let db = test_db(&temp_dir).await;
    let location = honduras_location(1, "HND001");
    db.insert_location(&location).await.unwrap();

    let locations = db.all_locations("HONDURAS").await.unwrap();
    assert_eq!(locations.len(), 1);

    let range = month_span("2025-04", "2025-04").unwrap();
    let source = CsvSource::new(&data_dir);
    let observations = source.fetch(&locations, &range).await.unwrap();
    assert_eq!(observations.len(), 60);

    let (valid, report) = DataValidator::new().validate(observations, &locations, &range);
    assert_eq!(report.valid_records, 60);
    assert!(report.gaps.is_empty());

    let aggregates = MonthlyAggregator::new(20).aggregate(&valid);
    assert_eq!(aggregates.len(), 2);

    db.upsert_monthly(&aggregates).await.unwrap();
    let history = db.monthly_history(1).await.unwrap();
    assert_eq!(history.len(), 2);

    let prec = history
        .iter()
        .find(|a| a.variable == ClimateVariable::Precipitation)
        .unwrap();
    assert_eq!(prec.value, 75.0); // 30 * 2.5, summed
    assert_eq!(prec.source_count, 30);

    let tmax = history
        .iter()
        .find(|a| a.variable == ClimateVariable::TempMax)
        .unwrap();
    assert_eq!(tmax.value, 31.0); // averaged
}

#[tokio::test]
async fn test_rerun_over_same_period_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();
    write_daily_csv(&data_dir, "prec", "HND001", 2025, &[(4, 30, 1.0)]);

    let db = test_db(&temp_dir).await;
    db.insert_location(&honduras_location(1, "HND001"))
        .await
        .unwrap();
    let locations = db.all_locations("HONDURAS").await.unwrap();
    let range = month_span("2025-04", "2025-04").unwrap();

    for _ in 0..2 {
        let observations = CsvSource::new(&data_dir)
            .fetch(&locations, &range)
            .await
            .unwrap();
        let (valid, _) = DataValidator::new().validate(observations, &locations, &range);
        let aggregates = MonthlyAggregator::new(20).aggregate(&valid);
        db.upsert_monthly(&aggregates).await.unwrap();
    }

    let history = db.monthly_history(1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].value, 30.0);
}

#[tokio::test]
async fn test_climatology_from_stored_history() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();

    let db = test_db(&temp_dir).await;
    db.insert_location(&honduras_location(1, "HND001"))
        .await
        .unwrap();
    let locations = db.all_locations("HONDURAS").await.unwrap();

    // Three Aprils of precipitation with different daily intensity.
    for (year, daily) in [(2023, 1.0), (2024, 2.0), (2025, 3.0)] {
        write_daily_csv(&data_dir, "prec", "HND001", year, &[(4, 30, daily)]);
        let range = month_span(&format!("{}-04", year), &format!("{}-04", year)).unwrap();
        let observations = CsvSource::new(&data_dir)
            .fetch(&locations, &range)
            .await
            .unwrap();
        let (valid, _) = DataValidator::new().validate(observations, &locations, &range);
        let aggregates = MonthlyAggregator::new(20).aggregate(&valid);
        db.upsert_monthly(&aggregates).await.unwrap();
    }

    let history = db.monthly_history(1).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|a| a.month == 4));

    let normals = ClimatologyCalculator::new(2).calculate(1, &history).unwrap();
    assert_eq!(normals.len(), 1);
    assert_eq!(normals[0].month, 4);
    assert_eq!(normals[0].value, 60.0); // mean of 30, 60, 90 mm
    assert_eq!(normals[0].year_span, 3);

    db.upsert_climatology(&normals).await.unwrap();
}

#[tokio::test]
async fn test_out_of_range_rows_never_reach_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();

    // 29 plausible days plus one physically impossible temperature.
    let mut body = String::from("ext_id,day,month,year,value\n");
    for day in 1..=29 {
        body.push_str(&format!("HND001,{},4,2025,31.0\n", day));
    }
    body.push_str("HND001,30,4,2025,999.0\n");
    fs::write(data_dir.join("tmax_daily_data.csv"), body).unwrap();

    let db = test_db(&temp_dir).await;
    db.insert_location(&honduras_location(1, "HND001"))
        .await
        .unwrap();
    let locations = db.all_locations("HONDURAS").await.unwrap();
    let range = month_span("2025-04", "2025-04").unwrap();

    let observations = CsvSource::new(&data_dir)
        .fetch(&locations, &range)
        .await
        .unwrap();
    assert_eq!(observations.len(), 30);

    let (valid, report) = DataValidator::new().validate(observations, &locations, &range);
    assert_eq!(report.dropped_records(), 1);
    assert_eq!(valid.len(), 29);

    let aggregates = MonthlyAggregator::new(20).aggregate(&valid);
    db.upsert_monthly(&aggregates).await.unwrap();

    let history = db.monthly_history(1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].value, 31.0);
    assert_eq!(history[0].source_count, 29);
}

#[tokio::test]
async fn test_date_range_filter_spans_months() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();

    // March through May; the run only asks for April.
    write_daily_csv(
        &data_dir,
        "tmin",
        "HND001",
        2025,
        &[(3, 31, 17.0), (4, 30, 18.0), (5, 31, 19.0)],
    );

    let db = test_db(&temp_dir).await;
    db.insert_location(&honduras_location(1, "HND001"))
        .await
        .unwrap();
    let locations = db.all_locations("HONDURAS").await.unwrap();
    let range = month_span("2025-04", "2025-04").unwrap();

    let observations = CsvSource::new(&data_dir)
        .fetch(&locations, &range)
        .await
        .unwrap();

    assert_eq!(observations.len(), 30);
    assert!(observations.iter().all(|o| o.date.month() == 4));
}
