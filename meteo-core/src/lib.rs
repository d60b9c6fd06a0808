//! Core library for the `meteo` weather sampler.
//!
//! This crate defines:
//! - Configuration loading (file, environment)
//! - The weather data source, the sample store and the spreadsheet exporter
//! - The concurrent core: a periodic scheduler and an operator control loop
//!   joined under one cooperative shutdown signal
//!
//! It is used by `meteo-cli`, but the collaborators sit behind traits so the
//! core can be driven with other implementations.

pub mod config;
pub mod control;
pub mod error;
pub mod export;
pub mod model;
pub mod provider;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use control::{Command, Console, ControlLoop, StdinConsole};
pub use error::{ControlError, CycleError, ExportError};
pub use export::{ExportReport, ExportTarget, Exporter, XlsxExporter, export_all};
pub use model::{Coordinates, PrecipitationKind, WeatherSample};
pub use provider::{DataSource, OpenMeteoSource};
pub use scheduler::{CycleStats, Scheduler};
pub use shutdown::ShutdownSignal;
pub use store::{MemoryStore, SqliteStore, Store};
