use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Text};
use meteo_core::{
    Config, DataSource, MemoryStore, OpenMeteoSource, SqliteStore, StdinConsole, Store,
    XlsxExporter, export_all, supervisor,
};
use std::{io::IsTerminal, path::PathBuf, sync::Arc};

use crate::console::TerminalConsole;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Periodic weather sampler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sample the weather periodically and serve the export/quit menu.
    ///
    /// When stdin is a terminal, logs go to daily files under the data
    /// directory (or `LOG_DIR`) instead of the prompt's screen. If sampling
    /// stops with an error while a prompt is open, the process exits without
    /// waiting for that prompt to be answered.
    Run(RunArgs),

    /// Interactively edit and save the configuration file.
    Configure,

    /// Fetch one sample now and print it.
    Show,

    /// Export the stored history to a new spreadsheet and exit.
    Export {
        /// Directory for the spreadsheet; overrides the configuration.
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Seconds between fetch cycles.
    #[arg(long)]
    pub frequency: Option<u64>,

    /// SQLite database file.
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory for spreadsheet exports.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Keep samples in memory only; nothing is written to disk except exports.
    #[arg(long)]
    pub in_memory: bool,
}

impl RunArgs {
    fn apply(&self, cfg: &mut Config) {
        if let Some(latitude) = self.latitude {
            cfg.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            cfg.longitude = longitude;
        }
        if let Some(frequency) = self.frequency {
            cfg.frequency_secs = frequency;
        }
        if let Some(database) = &self.database {
            cfg.database_path = Some(database.clone());
        }
        if let Some(dir) = &self.export_dir {
            cfg.export_dir = Some(dir.clone());
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Run(args) => {
                let mut cfg = load_config()?;
                args.apply(&mut cfg);
                cfg.validate()?;
                run_sampler(&cfg, args.in_memory).await
            }
            Command::Configure => configure(),
            Command::Show => {
                let cfg = load_config()?;
                cfg.validate()?;
                show(&cfg).await
            }
            Command::Export { export_dir } => {
                let mut cfg = load_config()?;
                if export_dir.is_some() {
                    cfg.export_dir = export_dir;
                }
                export_once(&cfg).await
            }
        }
    }
}

/// Stored config overlaid with the environment.
fn load_config() -> Result<Config> {
    let mut cfg = Config::load()?;
    cfg.apply_env()?;
    Ok(cfg)
}

async fn open_store(cfg: &Config) -> Result<SqliteStore> {
    let path = cfg.database_path()?;
    tracing::debug!(path = %path.display(), "Opening weather database");
    SqliteStore::open(&path).await
}

async fn run_sampler(cfg: &Config, in_memory: bool) -> Result<()> {
    let source = Arc::new(OpenMeteoSource::new(cfg.coordinates())?);
    let store: Arc<dyn Store> = if in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(open_store(cfg).await?)
    };
    let exporter = Arc::new(XlsxExporter::new(cfg.export_dir()));

    println!(
        "Sampling weather at {}°, {}° every {} s",
        cfg.latitude, cfg.longitude, cfg.frequency_secs
    );

    if std::io::stdin().is_terminal() {
        supervisor::run(cfg.period(), source, store, exporter, TerminalConsole).await
    } else {
        supervisor::run(cfg.period(), source, store, exporter, StdinConsole::new()).await
    }
}

async fn show(cfg: &Config) -> Result<()> {
    let source = OpenMeteoSource::new(cfg.coordinates())?;
    let sample = source.fetch().await?;

    println!("Location:      {}°, {}° ({})", cfg.latitude, cfg.longitude, sample.timezone);
    println!(
        "Observed at:   {}",
        sample.observed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!("Temperature:   {:.1} °C", sample.temperature_c);
    println!(
        "Precipitation: {:.1} mm ({})",
        sample.precipitation_mm, sample.precipitation_kind
    );
    println!("Pressure:      {:.2} mmHg", sample.pressure_mmhg);
    println!("Wind:          {:.2} m/s {}", sample.wind_speed_mps, sample.wind_direction);

    Ok(())
}

async fn export_once(cfg: &Config) -> Result<()> {
    let store = open_store(cfg).await?;
    let exporter = XlsxExporter::new(cfg.export_dir());

    let report = export_all(&store, &exporter).await?;
    println!("Exported {} records to {}", report.records, report.path.display());

    Ok(())
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    cfg.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(cfg.latitude)
        .with_error_message("Please enter a number, e.g. 52.54")
        .prompt()
        .context("Failed to read latitude")?;

    cfg.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(cfg.longitude)
        .with_error_message("Please enter a number, e.g. 13.41")
        .prompt()
        .context("Failed to read longitude")?;

    cfg.frequency_secs = CustomType::<u64>::new("Fetch period in seconds:")
        .with_default(cfg.frequency_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Failed to read fetch period")?;

    let export_dir = cfg.export_dir().display().to_string();
    let export_dir = Text::new("Export directory:")
        .with_default(&export_dir)
        .prompt()
        .context("Failed to read export directory")?;
    cfg.export_dir = Some(PathBuf::from(export_dir));

    cfg.validate()?;
    cfg.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
