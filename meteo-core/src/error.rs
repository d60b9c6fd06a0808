//! Error types for the long-running tasks.
//!
//! Collaborators report failures as [`anyhow::Error`]; the core wraps them so
//! every message names the operation that failed.

use std::path::PathBuf;
use thiserror::Error;

/// One scheduled fetch-and-persist cycle failed. Never fatal.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Failed to fetch weather sample: {0:#}")]
    Fetch(anyhow::Error),

    #[error("Failed to persist weather sample: {0:#}")]
    Persist(anyhow::Error),
}

/// An operator-triggered export failed. The control loop keeps running.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create export file: {0:#}")]
    CreateTarget(anyhow::Error),

    #[error("Failed to read stored weather samples: {0:#}")]
    ReadStore(anyhow::Error),

    #[error("Failed to write export file {}: {cause:#}", path.display())]
    Write { path: PathBuf, cause: anyhow::Error },
}

/// The control loop cannot continue serving the operator.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Failed to read operator command: {0:#}")]
    Input(anyhow::Error),

    #[error("Operator input closed before a quit command was received")]
    InputClosed,
}
