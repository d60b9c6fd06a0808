use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::{Coordinates, PrecipitationKind, WeatherSample},
    provider::{compass_direction, hpa_to_mmhg, kmh_to_mps},
};

use super::DataSource;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str =
    "temperature_2m,precipitation,rain,snowfall,pressure_msl,wind_speed_10m,wind_direction_10m";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    coordinates: Coordinates,
    http: Client,
}

impl OpenMeteoSource {
    pub fn new(coordinates: Coordinates) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Open-Meteo")?;

        Ok(Self { coordinates, http })
    }

    async fn fetch_current(&self) -> Result<OmResponse> {
        let res = self
            .http
            .get(FORECAST_URL)
            .query(&[
                ("latitude", self.coordinates.latitude.to_string()),
                ("longitude", self.coordinates.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse Open-Meteo current JSON")
    }

    fn normalize(&self, parsed: OmResponse, requested_at: DateTime<Utc>) -> Result<WeatherSample> {
        let current = parsed.current;
        let observed_at = local_to_utc(&current.time, parsed.utc_offset_seconds)?;

        Ok(WeatherSample {
            coordinates: self.coordinates,
            timezone: parsed.timezone,
            utc_offset_seconds: parsed.utc_offset_seconds,
            requested_at,
            observed_at,
            temperature_c: current.temperature_2m,
            precipitation_mm: current.precipitation,
            precipitation_kind: PrecipitationKind::classify(current.rain, current.snowfall),
            pressure_mmhg: hpa_to_mmhg(current.pressure_msl),
            wind_speed_mps: kmh_to_mps(current.wind_speed_10m),
            wind_direction: compass_direction(current.wind_direction_10m).to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: String,
    temperature_2m: f64,
    precipitation: f64,
    rain: f64,
    snowfall: f64,
    pressure_msl: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    timezone: String,
    utc_offset_seconds: i32,
    current: OmCurrent,
}

#[async_trait]
impl DataSource for OpenMeteoSource {
    async fn fetch(&self) -> Result<WeatherSample> {
        let requested_at = Utc::now();
        let parsed = self.fetch_current().await?;
        self.normalize(parsed, requested_at)
    }
}

/// Open-Meteo reports `current.time` in the response timezone, minute precision.
fn local_to_utc(time: &str, utc_offset_seconds: i32) -> Result<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("Invalid observation time '{time}' in Open-Meteo response"))?;

    let utc = local - Duration::seconds(i64::from(utc_offset_seconds));
    Ok(utc.and_utc())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
