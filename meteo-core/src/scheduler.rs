//! Periodic fetch → normalize → persist loop.
//!
//! Cycles run strictly one after another. The pause between the end of one
//! cycle and the start of the next is the configured period, so cycle starts
//! drift by the cycle's own duration. A failed cycle is logged and the loop
//! carries on at the next tick.

use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    error::CycleError,
    model::WeatherSample,
    provider::DataSource,
    shutdown::ShutdownSignal,
    store::Store,
};

/// Outcome counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug)]
pub struct Scheduler {
    source: Arc<dyn DataSource>,
    store: Arc<dyn Store>,
    period: Duration,
    shutdown: ShutdownSignal,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: Arc<dyn Store>,
        period: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self { source, store, period, shutdown }
    }

    /// Run until the shutdown signal is raised. In-flight cycles always
    /// complete; only the sleep between them is cut short.
    pub async fn run(self) -> CycleStats {
        let mut stats = CycleStats::default();
        info!(period_secs = self.period.as_secs(), "Scheduler started");

        loop {
            if self.shutdown.is_raised() {
                break;
            }

            match self.run_cycle().await {
                Ok(sample) => {
                    stats.succeeded += 1;
                    debug!(
                        observed_at = %sample.observed_at,
                        temperature_c = sample.temperature_c,
                        "Stored weather sample"
                    );
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(error = %err, "Weather cycle failed, retrying on next tick");
                }
            }

            if self.shutdown.is_raised() {
                break;
            }

            tokio::select! {
                _ = self.shutdown.raised() => {
                    debug!("Shutdown raised while waiting for next tick");
                    break;
                }
                _ = tokio::time::sleep(self.period) => {}
            }
        }

        info!(succeeded = stats.succeeded, failed = stats.failed, "Scheduler stopped");
        stats
    }

    async fn run_cycle(&self) -> Result<WeatherSample, CycleError> {
        let sample = self.source.fetch().await.map_err(CycleError::Fetch)?;
        self.store.append(&sample).await.map_err(CycleError::Persist)?;
        Ok(sample)
    }
}
