//! Binary crate for the `meteo` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and layering them over the stored configuration
//! - Interactive configuration and the operator prompt
//! - Logging setup and human-friendly output

use clap::Parser;
use meteo_core::Config;
use std::{io::IsTerminal, path::PathBuf};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod console;

const DEFAULT_LOG_FILTER: &str = "meteo_core=info,meteo_cli=info,sqlx=warn";

/// Used when the prompt owns the terminal and no log directory is available.
const QUIET_LOG_FILTER: &str = "warn";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    /// Daily-rotated `meteo.<date>.log` files in this directory.
    File(PathBuf),
    Stderr { default_filter: &'static str },
}

impl LogTarget {
    /// The operator prompt draws on stderr, so an interactive session must
    /// not log there at the default level.
    fn select(interactive: bool, log_dir: Option<PathBuf>) -> Self {
        match (interactive, log_dir) {
            (false, _) => LogTarget::Stderr { default_filter: DEFAULT_LOG_FILTER },
            (true, Some(dir)) => LogTarget::File(dir),
            (true, None) => LogTarget::Stderr { default_filter: QUIET_LOG_FILTER },
        }
    }
}

fn init_logging(target: LogTarget) -> Option<WorkerGuard> {
    let filter = |default: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    if let LogTarget::File(dir) = &target {
        let appender = std::fs::create_dir_all(dir).map_err(anyhow::Error::from).and_then(|()| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("meteo")
                .filename_suffix("log")
                .build(dir)
                .map_err(anyhow::Error::from)
        });

        match appender {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::registry()
                    .with(filter(DEFAULT_LOG_FILTER))
                    .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                    .init();
                return Some(guard);
            }
            Err(err) => {
                eprintln!("Cannot write logs to {}: {err:#}", dir.display());
            }
        }
    }

    let default_filter = match target {
        LogTarget::Stderr { default_filter } => default_filter,
        LogTarget::File(_) => QUIET_LOG_FILTER,
    };
    tracing_subscriber::registry()
        .with(filter(default_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    None
}

/// Print a failed command's error and pick the process exit status.
fn exit_status(outcome: anyhow::Result<()>) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Command failed");
            eprintln!("Error: {err:?}");
            1
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let log_dir = std::env::var_os("LOG_DIR").map(PathBuf::from).or_else(|| Config::log_dir().ok());
    let log_guard = init_logging(LogTarget::select(std::io::stdin().is_terminal(), log_dir));

    let cmd = cli::Cli::parse();
    let status = exit_status(cmd.run().await);

    drop(log_guard);
    // A terminal prompt may still be blocked on a keypress after the sampler
    // failed; dropping the runtime would wait for it.
    std::process::exit(status);
}
