use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

pub const DEFAULT_LATITUDE: f64 = 52.54;
pub const DEFAULT_LONGITUDE: f64 = 13.41;
pub const DEFAULT_FREQUENCY_SECS: u64 = 180;

const DATABASE_FILE_NAME: &str = "weather_data.db";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// latitude = 52.54
/// longitude = 13.41
/// frequency_secs = 180
/// export_dir = "exports"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,

    /// Seconds between the end of one fetch cycle and the start of the next.
    pub frequency_secs: u64,

    /// SQLite file; the platform data directory is used when unset.
    pub database_path: Option<PathBuf>,

    /// Directory for spreadsheet exports; the working directory when unset.
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            frequency_secs: DEFAULT_FREQUENCY_SECS,
            database_path: None,
            export_dir: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory for log files when the terminal is reserved for prompts.
    pub fn log_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("logs"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay `LATITUDE`, `LONGITUDE`, `FREQUENCY`, `DATABASE_PATH` and
    /// `EXPORT_DIR` as returned by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("LATITUDE") {
            self.latitude = parse_var("LATITUDE", &v)?;
        }
        if let Some(v) = lookup("LONGITUDE") {
            self.longitude = parse_var("LONGITUDE", &v)?;
        }
        if let Some(v) = lookup("FREQUENCY") {
            self.frequency_secs = parse_var("FREQUENCY", &v)?;
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            bail!("Invalid latitude {}: expected a value between -90 and 90", self.latitude);
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            bail!("Invalid longitude {}: expected a value between -180 and 180", self.longitude);
        }
        if self.frequency_secs == 0 {
            bail!("Invalid frequency 0: the fetch period must be at least one second");
        }
        Ok(())
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates { latitude: self.latitude, longitude: self.longitude }
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.frequency_secs)
    }

    /// Resolved SQLite file path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE_NAME)),
        }
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "meteo", "meteo")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value '{value}' for environment variable {name}"))
}
