use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::error::{EtlError, Result};
use crate::models::{ClimateVariable, ClimatologyNormal, Location, MonthlyAggregate};

/// Relational store for the location registry and the pipeline outputs.
///
/// Monthly aggregates upsert on (location_id, variable, year, month) and
/// climatology normals on (location_id, variable, month), so re-running the
/// pipeline over an overlapping period is idempotent.
pub struct ClimateDb {
    pool: SqlitePool,
}

impl ClimateDb {
    pub async fn connect(database_url: &str) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            debug!(url = %database_url, "creating database");
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;
        let db = Self { pool };
        db.init_schema().await?;
        info!("database connection established");
        Ok(db)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                ext_id TEXT,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS climate_monthly (
                location_id INTEGER NOT NULL,
                variable TEXT NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                value REAL NOT NULL,
                source_count INTEGER NOT NULL,
                PRIMARY KEY (location_id, variable, year, month)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS climate_climatology (
                location_id INTEGER NOT NULL,
                variable TEXT NOT NULL,
                month INTEGER NOT NULL,
                value REAL NOT NULL,
                year_span INTEGER NOT NULL,
                PRIMARY KEY (location_id, variable, month)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register or refresh a location row.
    pub async fn insert_location(&self, location: &Location) -> Result<()> {
        location.validate()?;
        sqlx::query(
            "INSERT INTO locations (id, name, country, ext_id, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 country = excluded.country,
                 ext_id = excluded.ext_id,
                 latitude = excluded.latitude,
                 longitude = excluded.longitude",
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(&location.country)
        .bind(&location.ext_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn all_locations(&self, country: &str) -> Result<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, name, country, ext_id, latitude, longitude
             FROM locations WHERE UPPER(country) = UPPER(?1) ORDER BY id",
        )
        .bind(country)
        .fetch_all(&self.pool)
        .await?;

        for location in &locations {
            location.validate()?;
        }
        info!(
            country,
            count = locations.len(),
            "retrieved locations from registry"
        );
        Ok(locations)
    }

    pub async fn locations_by_ids(&self, ids: &[i64], country: &str) -> Result<Vec<Location>> {
        let mut locations = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query_as::<_, Location>(
                "SELECT id, name, country, ext_id, latitude, longitude
                 FROM locations WHERE id = ?1 AND UPPER(country) = UPPER(?2)",
            )
            .bind(id)
            .bind(country)
            .fetch_optional(&self.pool)
            .await?;

            match row {
                Some(location) => {
                    location.validate()?;
                    locations.push(location);
                }
                None => warn!(location_id = id, country, "location not found in registry"),
            }
        }
        info!(
            requested = ids.len(),
            found = locations.len(),
            "retrieved locations by id"
        );
        Ok(locations)
    }

    pub async fn upsert_monthly(&self, aggregates: &[MonthlyAggregate]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for aggregate in aggregates {
            sqlx::query(
                "INSERT INTO climate_monthly
                     (location_id, variable, year, month, value, source_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(location_id, variable, year, month)
                 DO UPDATE SET value = excluded.value,
                               source_count = excluded.source_count",
            )
            .bind(aggregate.location_id)
            .bind(aggregate.variable.short_name())
            .bind(aggregate.year as i64)
            .bind(aggregate.month as i64)
            .bind(aggregate.value)
            .bind(aggregate.source_count as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(records = aggregates.len(), "monthly aggregates upserted");
        Ok(aggregates.len() as u64)
    }

    pub async fn upsert_climatology(&self, normals: &[ClimatologyNormal]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for normal in normals {
            sqlx::query(
                "INSERT INTO climate_climatology
                     (location_id, variable, month, value, year_span)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(location_id, variable, month)
                 DO UPDATE SET value = excluded.value,
                               year_span = excluded.year_span",
            )
            .bind(normal.location_id)
            .bind(normal.variable.short_name())
            .bind(normal.month as i64)
            .bind(normal.value)
            .bind(normal.year_span as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(records = normals.len(), "climatology normals upserted");
        Ok(normals.len() as u64)
    }

    /// Full monthly history for one location, ordered for the climatology
    /// step.
    pub async fn monthly_history(&self, location_id: i64) -> Result<Vec<MonthlyAggregate>> {
        let rows = sqlx::query_as::<_, (i64, String, i64, i64, f64, i64)>(
            "SELECT location_id, variable, year, month, value, source_count
             FROM climate_monthly WHERE location_id = ?1
             ORDER BY variable, year, month",
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for (location_id, variable, year, month, value, source_count) in rows {
            history.push(MonthlyAggregate {
                location_id,
                variable: decode_variable(&variable)?,
                year: year as i32,
                month: month as u32,
                value,
                source_count: source_count as u32,
            });
        }
        Ok(history)
    }
}

fn decode_variable(short_name: &str) -> Result<ClimateVariable> {
    ClimateVariable::from_short_name(short_name)
        .ok_or_else(|| EtlError::Storage(format!("unknown variable '{}' in store", short_name)))
}
