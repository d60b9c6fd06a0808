use crate::model::WeatherSample;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod open_meteo;

pub use open_meteo::OpenMeteoSource;

/// Produces one normalized sample per call, or fails without a partial one.
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    async fn fetch(&self) -> anyhow::Result<WeatherSample>;
}

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Eight-point compass abbreviation for a bearing in degrees.
pub fn compass_direction(degrees: f64) -> &'static str {
    let index = (degrees / 45.0).round().rem_euclid(8.0) as usize;
    COMPASS_POINTS[index]
}

pub fn kmh_to_mps(speed_kmh: f64) -> f64 {
    round2(speed_kmh * 1000.0 / 3600.0)
}

pub fn hpa_to_mmhg(pressure_hpa: f64) -> f64 {
    round2(pressure_hpa / 1.333)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
