//! Tabular export of the stored sample history.

use async_trait::async_trait;
use std::{fmt::Debug, path::PathBuf};

use crate::{error::ExportError, model::WeatherSample, store::Store};

pub mod xlsx;

pub use xlsx::XlsxExporter;

/// Column headers, in sheet order.
pub const COLUMNS: [&str; 13] = [
    "No.",
    "Latitude",
    "Longitude",
    "Timezone",
    "UTC offset (s)",
    "Requested at",
    "Observed at",
    "Temperature (°C)",
    "Precipitation (mm)",
    "Precipitation type",
    "Pressure (mmHg)",
    "Wind speed (m/s)",
    "Wind direction",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A freshly created export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub path: PathBuf,
}

#[async_trait]
pub trait Exporter: Send + Sync + Debug {
    /// Create a new, header-only export file.
    async fn create_target(&self) -> anyhow::Result<ExportTarget>;

    /// Write `records` below the header row of `target`.
    async fn write(&self, target: &ExportTarget, records: &[WeatherSample]) -> anyhow::Result<()>;
}

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// Cells for the sample at 1-based position `number`, aligned with [`COLUMNS`].
pub fn sample_row(number: usize, sample: &WeatherSample) -> [Cell; 13] {
    [
        Cell::Number(number as f64),
        Cell::Number(sample.coordinates.latitude),
        Cell::Number(sample.coordinates.longitude),
        Cell::Text(sample.timezone.clone()),
        Cell::Number(f64::from(sample.utc_offset_seconds)),
        Cell::Text(sample.requested_at.format(TIMESTAMP_FORMAT).to_string()),
        Cell::Text(sample.observed_at.format(TIMESTAMP_FORMAT).to_string()),
        Cell::Number(sample.temperature_c),
        Cell::Number(sample.precipitation_mm),
        Cell::Text(sample.precipitation_kind.to_string()),
        Cell::Number(sample.pressure_mmhg),
        Cell::Number(sample.wind_speed_mps),
        Cell::Text(sample.wind_direction.clone()),
    ]
}

/// Summary of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub records: usize,
}

/// Create a new export file and fill it with everything in `store`.
pub async fn export_all(
    store: &dyn Store,
    exporter: &dyn Exporter,
) -> Result<ExportReport, ExportError> {
    let target = exporter.create_target().await.map_err(ExportError::CreateTarget)?;
    let records = store.read_all().await.map_err(ExportError::ReadStore)?;

    exporter
        .write(&target, &records)
        .await
        .map_err(|cause| ExportError::Write { path: target.path.clone(), cause })?;

    Ok(ExportReport { path: target.path, records: records.len() })
}
