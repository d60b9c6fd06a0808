//! Joins the scheduler and the control loop under one shutdown signal.

use anyhow::{Result, anyhow, bail};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

use crate::{
    control::{Console, ControlLoop},
    export::Exporter,
    provider::DataSource,
    scheduler::Scheduler,
    shutdown::ShutdownSignal,
    store::Store,
};

/// Shortest fetch period accepted.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Run the scheduler and the control loop as two tasks until both have
/// stopped.
///
/// The control loop is the normal source of shutdown. If either task ends
/// abnormally the signal is raised so the other one stops too, and the first
/// failure is returned once both have exited.
pub async fn run<C>(
    period: Duration,
    source: Arc<dyn DataSource>,
    store: Arc<dyn Store>,
    exporter: Arc<dyn Exporter>,
    console: C,
) -> Result<()>
where
    C: Console + 'static,
{
    if period < MIN_PERIOD {
        bail!("Fetch period must be at least one second");
    }

    let shutdown = ShutdownSignal::new();
    let scheduler = Scheduler::new(source, store.clone(), period, shutdown.clone());
    let control = ControlLoop::new(store, exporter, shutdown.clone(), console);

    let scheduler_task = tokio::spawn(scheduler.run());
    let control_task = tokio::spawn(control.run());

    // A task that dies must not leave its sibling waiting forever.
    let scheduler_watch = async {
        let outcome = scheduler_task.await;
        if outcome.is_err() {
            shutdown.raise();
        }
        outcome
    };
    let control_watch = async {
        let outcome = control_task.await;
        if !matches!(outcome, Ok(Ok(()))) {
            shutdown.raise();
        }
        outcome
    };

    let (scheduler_outcome, control_outcome) = tokio::join!(scheduler_watch, control_watch);

    match &scheduler_outcome {
        Ok(stats) => info!(succeeded = stats.succeeded, failed = stats.failed, "Scheduler joined"),
        Err(err) => error!(error = %err, "Scheduler task panicked"),
    }

    match control_outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(err.into()),
        Err(err) => return Err(anyhow!("Control loop task panicked: {err}")),
    }
    scheduler_outcome.map_err(|err| anyhow!("Scheduler task panicked: {err}"))?;

    info!("Shutdown complete");
    Ok(())
}
