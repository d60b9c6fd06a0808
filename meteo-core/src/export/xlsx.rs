use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

use super::{COLUMNS, Cell, ExportTarget, Exporter, sample_row};
use crate::model::WeatherSample;

const SHEET_NAME: &str = "Weather Data";

/// Writes `.xlsx` workbooks into a directory, one timestamp-named file per export.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    dir: PathBuf,
}

impl XlsxExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Exporter for XlsxExporter {
    async fn create_target(&self) -> Result<ExportTarget> {
        let dir = self.dir.clone();

        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir).with_context(|| {
                format!("Failed to create export directory: {}", dir.display())
            })?;

            let path = unused_path(&dir, Local::now());
            write_workbook(&path, &sheet_rows(&[]))?;
            Ok(ExportTarget { path })
        })
        .await
        .context("Export task panicked")?
    }

    async fn write(&self, target: &ExportTarget, records: &[WeatherSample]) -> Result<()> {
        let path = target.path.clone();
        let rows = sheet_rows(records);

        tokio::task::spawn_blocking(move || write_workbook(&path, &rows))
            .await
            .context("Export task panicked")?
    }
}

/// Header row followed by one row per record.
fn sheet_rows(records: &[WeatherSample]) -> Vec<Vec<Cell>> {
    let header: Vec<Cell> = COLUMNS.iter().map(|name| Cell::Text(name.to_string())).collect();

    std::iter::once(header)
        .chain(records.iter().enumerate().map(|(i, s)| sample_row(i + 1, s).to_vec()))
        .collect()
}

fn write_workbook(path: &Path, rows: &[Vec<Cell>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r).context("Too many rows for a worksheet")?;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Number(n) => sheet.write_number(r, c, *n)?,
                Cell::Text(s) if r == 0 => sheet.write_string_with_format(r, c, s, &bold)?,
                Cell::Text(s) => sheet.write_string(r, c, s)?,
            };
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))
}

fn file_name(stamp: DateTime<Local>, attempt: u32) -> String {
    let stamp = stamp.format("%Y-%m-%d_%H-%M-%S");
    match attempt {
        0 => format!("weather_data_{stamp}.xlsx"),
        n => format!("weather_data_{stamp}_{n}.xlsx"),
    }
}

fn unused_path(dir: &Path, stamp: DateTime<Local>) -> PathBuf {
    (0..)
        .map(|attempt| dir.join(file_name(stamp, attempt)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(file_name(stamp, 0)))
}
