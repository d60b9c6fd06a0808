use async_trait::async_trait;
use parking_lot::Mutex;

use super::Store;
use crate::model::WeatherSample;

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    samples: Mutex<Vec<WeatherSample>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn append(&self, sample: &WeatherSample) -> anyhow::Result<()> {
        self.samples.lock().push(sample.clone());
        Ok(())
    }

    async fn read_all(&self) -> anyhow::Result<Vec<WeatherSample>> {
        Ok(self.samples.lock().clone())
    }
}
