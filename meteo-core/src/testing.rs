//! Fakes shared by the unit tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{sync::Notify, time::Instant};

use crate::{
    control::Console,
    export::{ExportTarget, Exporter},
    model::{Coordinates, PrecipitationKind, WeatherSample},
    provider::DataSource,
    store::Store,
};

/// Deterministic sample; `n` shifts the timestamps and temperature.
pub fn sample_at(n: i64) -> WeatherSample {
    let observed_at =
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() + ChronoDuration::minutes(3 * n);

    WeatherSample {
        coordinates: Coordinates { latitude: 52.54, longitude: 13.41 },
        timezone: "Europe/Berlin".to_string(),
        utc_offset_seconds: 3600,
        requested_at: observed_at + ChronoDuration::seconds(5),
        observed_at,
        temperature_c: -2.0 + n as f64,
        precipitation_mm: 0.4,
        precipitation_kind: PrecipitationKind::Rain,
        pressure_mmhg: 755.2,
        wind_speed_mps: 3.61,
        wind_direction: "SW".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct FakeSource {
    latency: Duration,
    fail_first: usize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    starts: Mutex<Vec<Instant>>,
    notify: Notify,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_starts(&self) -> Vec<Instant> {
        self.starts.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` fetches have started.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.calls() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch(&self) -> Result<WeatherSample> {
        self.starts.lock().push(Instant::now());
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.notify.notify_waiters();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if call <= self.fail_first {
            Err(anyhow!("upstream unavailable (call {call})"))
        } else {
            Ok(sample_at(call as i64))
        }
    }
}

#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn append(&self, _sample: &WeatherSample) -> Result<()> {
        Err(anyhow!("database is locked"))
    }

    async fn read_all(&self) -> Result<Vec<WeatherSample>> {
        Err(anyhow!("database is locked"))
    }
}

/// Keeps everything written to it in memory instead of on disk.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    created: AtomicUsize,
    written: Mutex<Vec<(PathBuf, Vec<WeatherSample>)>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<(PathBuf, Vec<WeatherSample>)> {
        self.written.lock().clone()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn create_target(&self) -> Result<ExportTarget> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ExportTarget { path: PathBuf::from(format!("export_{n}.xlsx")) })
    }

    async fn write(&self, target: &ExportTarget, records: &[WeatherSample]) -> Result<()> {
        self.written.lock().push((target.path.clone(), records.to_vec()));
        Ok(())
    }
}

#[derive(Debug)]
pub struct FailingExporter {
    on_create: bool,
}

impl FailingExporter {
    pub fn on_create() -> Self {
        Self { on_create: true }
    }

    pub fn on_write() -> Self {
        Self { on_create: false }
    }
}

#[async_trait]
impl Exporter for FailingExporter {
    async fn create_target(&self) -> Result<ExportTarget> {
        if self.on_create {
            return Err(anyhow!("permission denied"));
        }
        Ok(ExportTarget { path: PathBuf::from("broken.xlsx") })
    }

    async fn write(&self, _target: &ExportTarget, _records: &[WeatherSample]) -> Result<()> {
        Err(anyhow!("no space left on device"))
    }
}

/// One scripted operator interaction.
#[derive(Debug, Clone)]
pub enum Step {
    Line(&'static str),
    /// Let time pass before the next step is consumed.
    Wait(Duration),
    Closed,
    Fail(&'static str),
}

/// Replays a script of operator input and records everything shown.
/// Once the script runs out, reads never complete.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConsole {
    script: Arc<Mutex<VecDeque<Step>>>,
    output: Arc<Mutex<Vec<String>>>,
    prompts: Arc<AtomicUsize>,
}

impl ScriptedConsole {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn lines(lines: &[&'static str]) -> Self {
        Self::new(lines.iter().copied().map(Step::Line))
    }

    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.output.lock().iter().any(|line| line.contains(needle))
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        loop {
            let step = self.script.lock().pop_front();
            match step {
                Some(Step::Line(line)) => return Ok(Some(line.to_string())),
                Some(Step::Wait(d)) => tokio::time::sleep(d).await,
                Some(Step::Closed) => return Ok(None),
                Some(Step::Fail(msg)) => return Err(anyhow!(msg)),
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn say(&mut self, message: &str) {
        self.output.lock().push(message.to_string());
    }
}
