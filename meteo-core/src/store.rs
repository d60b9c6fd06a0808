//! Persistence of normalized samples.
//!
//! Implementations must tolerate single-record appends interleaved with full
//! reads from another task.

use crate::model::WeatherSample;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait Store: Send + Sync + Debug {
    async fn append(&self, sample: &WeatherSample) -> anyhow::Result<()>;

    /// Every stored sample, in insertion order.
    async fn read_all(&self) -> anyhow::Result<Vec<WeatherSample>>;
}
