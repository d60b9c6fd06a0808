use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use std::{path::Path, str::FromStr, time::Duration};

use super::Store;
use crate::model::{Coordinates, PrecipitationKind, WeatherSample};

const POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS weather_data (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude           REAL    NOT NULL,
    longitude          REAL    NOT NULL,
    timezone           TEXT    NOT NULL,
    utc_offset_seconds INTEGER NOT NULL,
    requested_at       TEXT    NOT NULL,
    observed_at        TEXT    NOT NULL,
    temperature_c      REAL    NOT NULL,
    precipitation_mm   REAL    NOT NULL,
    precipitation_kind TEXT    NOT NULL,
    pressure_mmhg      REAL    NOT NULL,
    wind_speed_mps     REAL    NOT NULL,
    wind_direction     TEXT    NOT NULL
)
"#;

/// SQLite-backed store; the pool serializes concurrent appends and reads.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file and its table.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly useful for tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Failed to build in-memory database options")?;

        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .context("Failed to create weather_data table")?;

        tracing::debug!("weather_data table ready");
        Ok(Self { pool })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WeatherRow {
    latitude: f64,
    longitude: f64,
    timezone: String,
    utc_offset_seconds: i32,
    requested_at: DateTime<Utc>,
    observed_at: DateTime<Utc>,
    temperature_c: f64,
    precipitation_mm: f64,
    precipitation_kind: String,
    pressure_mmhg: f64,
    wind_speed_mps: f64,
    wind_direction: String,
}

impl TryFrom<WeatherRow> for WeatherSample {
    type Error = anyhow::Error;

    fn try_from(row: WeatherRow) -> Result<Self> {
        Ok(WeatherSample {
            coordinates: Coordinates { latitude: row.latitude, longitude: row.longitude },
            timezone: row.timezone,
            utc_offset_seconds: row.utc_offset_seconds,
            requested_at: row.requested_at,
            observed_at: row.observed_at,
            temperature_c: row.temperature_c,
            precipitation_mm: row.precipitation_mm,
            precipitation_kind: PrecipitationKind::try_from(row.precipitation_kind.as_str())?,
            pressure_mmhg: row.pressure_mmhg,
            wind_speed_mps: row.wind_speed_mps,
            wind_direction: row.wind_direction,
        })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn append(&self, sample: &WeatherSample) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_data (
                latitude, longitude, timezone, utc_offset_seconds,
                requested_at, observed_at, temperature_c, precipitation_mm,
                precipitation_kind, pressure_mmhg, wind_speed_mps, wind_direction
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sample.coordinates.latitude)
        .bind(sample.coordinates.longitude)
        .bind(&sample.timezone)
        .bind(sample.utc_offset_seconds)
        .bind(sample.requested_at)
        .bind(sample.observed_at)
        .bind(sample.temperature_c)
        .bind(sample.precipitation_mm)
        .bind(sample.precipitation_kind.as_str())
        .bind(sample.pressure_mmhg)
        .bind(sample.wind_speed_mps)
        .bind(&sample.wind_direction)
        .execute(&self.pool)
        .await
        .context("Failed to insert weather sample")?;

        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<WeatherSample>> {
        let rows = sqlx::query_as::<_, WeatherRow>(
            r#"
            SELECT latitude, longitude, timezone, utc_offset_seconds,
                   requested_at, observed_at, temperature_c, precipitation_mm,
                   precipitation_kind, pressure_mmhg, wind_speed_mps, wind_direction
            FROM weather_data
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query weather samples")?;

        rows.into_iter().map(WeatherSample::try_from).collect()
    }
}
