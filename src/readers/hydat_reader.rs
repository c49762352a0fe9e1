use crate::error::{AnalysisError, Result};
use crate::models::{
    DataType, DatumConversion, DatumId, Observation, RegulationRecord, Station, StationId,
    TemperatureSample,
};
use crate::readers::schema::{self, TableSchema};
use crate::readers::snapshot::Snapshot;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STATIONS_SQL: &str = "SELECT STATION_NUMBER AS station_number, \
     STATION_NAME AS station_name, \
     CAST(LATITUDE AS REAL) AS latitude, \
     CAST(LONGITUDE AS REAL) AS longitude, \
     CAST(DATUM_ID AS INTEGER) AS datum_id \
     FROM STATIONS ORDER BY STATION_NUMBER";

const OBSERVATIONS_SQL: &str = "SELECT STATION_NUMBER AS station_number, \
     CAST(YEAR AS INTEGER) AS year, \
     CAST(MEAN AS REAL) AS mean, \
     CAST(MIN AS REAL) AS min, \
     CAST(MAX AS REAL) AS max \
     FROM ANNUAL_STATISTICS WHERE DATA_TYPE = ?1 \
     ORDER BY STATION_NUMBER, YEAR";

const REGULATION_SQL: &str = "SELECT STATION_NUMBER AS station_number, \
     CAST(REGULATED AS INTEGER) AS regulated \
     FROM STN_REGULATION ORDER BY STATION_NUMBER";

const CONVERSIONS_SQL: &str = "SELECT STATION_NUMBER AS station_number, \
     CAST(DATUM_ID_FROM AS INTEGER) AS datum_from, \
     CAST(DATUM_ID_TO AS INTEGER) AS datum_to, \
     CAST(CONVERSION_FACTOR AS REAL) AS factor \
     FROM STN_DATUM_CONVERSION ORDER BY STATION_NUMBER";

const TEMPERATURE_SQL: &str = "SELECT STATION_NUMBER AS station_number, \
     DATE AS sample_date, \
     CAST(TEMPERATURE AS REAL) AS temperature \
     FROM SED_SAMPLES WHERE TEMPERATURE IS NOT NULL ORDER BY DATE";

const DATUM_NAMES_SQL: &str =
    "SELECT CAST(DATUM_ID AS INTEGER) AS datum_id, DATUM_EN AS name FROM DATUM_LIST";

#[derive(sqlx::FromRow)]
struct StationRow {
    station_number: String,
    station_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    datum_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ObservationRow {
    station_number: String,
    year: Option<i64>,
    mean: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct RegulationRow {
    station_number: String,
    regulated: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ConversionRow {
    station_number: String,
    datum_from: Option<i64>,
    datum_to: Option<i64>,
    factor: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct TemperatureRow {
    station_number: String,
    sample_date: Option<String>,
    temperature: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct DatumNameRow {
    datum_id: Option<i64>,
    name: Option<String>,
}

/// Read-only handle on a HYDAT SQLite file.
///
/// Opened once per run; the single pooled connection is released by
/// [`HydatStore::close`] or when the handle is dropped.
pub struct HydatStore {
    path: PathBuf,
    pool: SqlitePool,
}

impl HydatStore {
    /// Open the store read-only and check the core tables.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::open_requiring(path, &schema::CORE_TABLES).await
    }

    /// Open the store read-only, checking only `required`.
    pub async fn open_requiring(path: &Path, required: &[&TableSchema]) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::unavailable(path, "no such file"));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AnalysisError::unavailable(path, e.to_string()))?;

        let store = Self {
            path: path.to_path_buf(),
            pool,
        };

        for table in required {
            if let Err(e) = store.require_table(table).await {
                store.pool.close().await;
                return Err(e);
            }
        }

        info!("Opened HYDAT store at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn close(self) {
        self.pool.close().await;
        debug!("Closed HYDAT store at {}", self.path.display());
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AnalysisError::unavailable(&self.path, e.to_string()))
    }

    /// Fails with `SchemaMismatch` when the table or one of its columns is absent.
    pub async fn require_table(&self, table: &TableSchema) -> Result<()> {
        let present = self.table_columns(table.name).await?;

        if present.is_empty() {
            return Err(AnalysisError::SchemaMismatch {
                table: table.name.to_string(),
                column: None,
            });
        }

        if let Some(column) = schema::first_missing_column(table, &present) {
            return Err(AnalysisError::SchemaMismatch {
                table: table.name.to_string(),
                column: Some(column.to_string()),
            });
        }

        Ok(())
    }

    pub async fn has_table(&self, table: &TableSchema) -> Result<bool> {
        Ok(self.require_table(table).await.is_ok())
    }

    /// Row counts for every known table; `None` marks tables absent or incomplete.
    pub async fn table_counts(&self) -> Result<Vec<(&'static str, Option<i64>)>> {
        let mut counts = Vec::with_capacity(schema::KNOWN_TABLES.len());

        for table in schema::KNOWN_TABLES {
            if !self.has_table(table).await? {
                counts.push((table.name, None));
                continue;
            }

            // Table names come from the fixed schema list, never from input.
            let sql = format!("SELECT COUNT(*) FROM {}", table.name);
            let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
            counts.push((table.name, Some(count)));
        }

        Ok(counts)
    }

    pub async fn fetch_stations(&self) -> Result<Vec<Station>> {
        query_stations(&self.pool).await
    }

    pub async fn fetch_observations(&self, data_type: DataType) -> Result<Vec<Observation>> {
        query_observations(&self.pool, data_type).await
    }

    pub async fn fetch_regulation_records(&self) -> Result<Vec<RegulationRecord>> {
        query_regulation(&self.pool).await
    }

    pub async fn fetch_datum_conversions(&self) -> Result<Vec<DatumConversion>> {
        query_conversions(&self.pool).await
    }

    pub async fn fetch_temperature_samples(&self) -> Result<Vec<TemperatureSample>> {
        self.require_table(&schema::SED_SAMPLES).await?;

        let rows: Vec<TemperatureRow> = sqlx::query_as(TEMPERATURE_SQL)
            .fetch_all(&self.pool)
            .await?;

        let total = rows.len();
        let samples: Vec<TemperatureSample> = rows.into_iter().filter_map(temperature_from_row).collect();

        if samples.len() < total {
            warn!(
                "Skipped {} temperature samples with unreadable dates",
                total - samples.len()
            );
        }
        info!("Loaded {} temperature samples", samples.len());

        Ok(samples)
    }

    /// English datum names keyed by id; empty when `DATUM_LIST` is not present.
    pub async fn fetch_datum_names(&self) -> Result<HashMap<DatumId, String>> {
        if !self.has_table(&schema::DATUM_LIST).await? {
            debug!("DATUM_LIST not present, datum names unavailable");
            return Ok(HashMap::new());
        }

        let rows: Vec<DatumNameRow> = sqlx::query_as(DATUM_NAMES_SQL)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| Some((DatumId(row.datum_id?), row.name?.trim().to_string())))
            .collect())
    }

    /// Load stations, observations, regulation flags and conversions in one read transaction.
    pub async fn snapshot(&self, data_type: DataType) -> Result<Snapshot> {
        let mut tx = self.pool.begin().await?;

        let stations = query_stations(&mut *tx).await?;
        let observations = query_observations(&mut *tx, data_type).await?;
        let regulation = query_regulation(&mut *tx).await?;
        let conversions = query_conversions(&mut *tx).await?;

        tx.rollback().await?;

        Ok(Snapshot::new(
            data_type,
            stations,
            observations,
            regulation,
            conversions,
        ))
    }
}

async fn query_stations<'e, E>(executor: E) -> Result<Vec<Station>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<StationRow> = sqlx::query_as(STATIONS_SQL).fetch_all(executor).await?;

    let stations: Vec<Station> = rows
        .into_iter()
        .map(|row| {
            Station::new(
                StationId::new(row.station_number.trim()),
                row.station_name.unwrap_or_default().trim().to_string(),
                row.latitude.unwrap_or(f64::NAN),
                row.longitude.unwrap_or(f64::NAN),
                row.datum_id.map(DatumId),
            )
        })
        .collect();

    info!("Loaded {} stations", stations.len());
    Ok(stations)
}

async fn query_observations<'e, E>(executor: E, data_type: DataType) -> Result<Vec<Observation>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<ObservationRow> = sqlx::query_as(OBSERVATIONS_SQL)
        .bind(data_type.code())
        .fetch_all(executor)
        .await?;

    let mut observations = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(year) = row.year else {
            debug!("Skipping {} observation without a year", row.station_number);
            continue;
        };
        let year = i32::try_from(year)
            .map_err(|_| AnalysisError::InvalidFormat(format!("Year out of range: {}", year)))?;

        observations.push(Observation::new(
            StationId::new(row.station_number.trim()),
            year,
            data_type,
            row.mean,
            row.min,
            row.max,
        ));
    }

    info!(
        "Loaded {} annual {} observations",
        observations.len(),
        data_type.display_name().to_lowercase()
    );
    Ok(observations)
}

async fn query_regulation<'e, E>(executor: E) -> Result<Vec<RegulationRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<RegulationRow> = sqlx::query_as(REGULATION_SQL).fetch_all(executor).await?;

    let records: Vec<RegulationRecord> = rows
        .into_iter()
        .map(|row| {
            RegulationRecord::new(
                StationId::new(row.station_number.trim()),
                row.regulated.is_some_and(|flag| flag != 0),
            )
        })
        .collect();

    debug!("Loaded {} regulation records", records.len());
    Ok(records)
}

async fn query_conversions<'e, E>(executor: E) -> Result<Vec<DatumConversion>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<ConversionRow> = sqlx::query_as(CONVERSIONS_SQL).fetch_all(executor).await?;

    let conversions: Vec<DatumConversion> = rows
        .into_iter()
        .filter_map(|row| {
            let (Some(from), Some(to)) = (row.datum_from, row.datum_to) else {
                debug!("Skipping conversion for {} without datum ids", row.station_number);
                return None;
            };
            Some(DatumConversion::new(
                StationId::new(row.station_number.trim()),
                DatumId(from),
                DatumId(to),
                row.factor,
            ))
        })
        .collect();

    debug!("Loaded {} datum conversions", conversions.len());
    Ok(conversions)
}

fn temperature_from_row(row: TemperatureRow) -> Option<TemperatureSample> {
    let temperature = row.temperature?;
    let date = parse_sample_date(row.sample_date.as_deref()?)?;
    Some(TemperatureSample::new(
        StationId::new(row.station_number.trim()),
        date,
        temperature,
    ))
}

/// Sample dates are stored as `YYYY-MM-DD` with an optional time part.
fn parse_sample_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_date() {
        assert_eq!(
            parse_sample_date("1965-06-01 00:00:00"),
            NaiveDate::from_ymd_opt(1965, 6, 1)
        );
        assert_eq!(
            parse_sample_date("2001-12-31"),
            NaiveDate::from_ymd_opt(2001, 12, 31)
        );
        assert_eq!(parse_sample_date("12/31/2001"), None);
        assert_eq!(parse_sample_date("2001"), None);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = HydatStore::open(&dir.path().join("Hydat.sqlite3")).await;

        assert!(matches!(
            result,
            Err(AnalysisError::DataUnavailable { .. })
        ));
    }
}
