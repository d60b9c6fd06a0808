use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic point the sampler is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Kind of precipitation reported alongside the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationKind {
    None,
    Rain,
    Snow,
    Mixed,
}

impl PrecipitationKind {
    /// Classify from the rain and snowfall amounts of one observation.
    pub fn classify(rain: f64, snowfall: f64) -> Self {
        match (rain > 0.0, snowfall > 0.0) {
            (false, false) => PrecipitationKind::None,
            (true, false) => PrecipitationKind::Rain,
            (false, true) => PrecipitationKind::Snow,
            (true, true) => PrecipitationKind::Mixed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipitationKind::None => "none",
            PrecipitationKind::Rain => "rain",
            PrecipitationKind::Snow => "snow",
            PrecipitationKind::Mixed => "mixed",
        }
    }
}

impl fmt::Display for PrecipitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PrecipitationKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "none" => Ok(PrecipitationKind::None),
            "rain" => Ok(PrecipitationKind::Rain),
            "snow" => Ok(PrecipitationKind::Snow),
            "mixed" => Ok(PrecipitationKind::Mixed),
            _ => Err(anyhow::anyhow!("Unknown precipitation kind '{value}'")),
        }
    }
}

/// One normalized observation, built once per successful fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub coordinates: Coordinates,
    pub timezone: String,
    pub utc_offset_seconds: i32,
    pub requested_at: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub precipitation_kind: PrecipitationKind,
    pub pressure_mmhg: f64,
    pub wind_speed_mps: f64,
    /// Compass abbreviation, e.g. "NE".
    pub wind_direction: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_combination() {
        assert_eq!(PrecipitationKind::classify(0.0, 0.0), PrecipitationKind::None);
        assert_eq!(PrecipitationKind::classify(1.2, 0.0), PrecipitationKind::Rain);
        assert_eq!(PrecipitationKind::classify(0.0, 0.4), PrecipitationKind::Snow);
        assert_eq!(PrecipitationKind::classify(0.3, 0.4), PrecipitationKind::Mixed);
    }

    #[test]
    fn precipitation_kind_parses_its_own_names() {
        for kind in [
            PrecipitationKind::None,
            PrecipitationKind::Rain,
            PrecipitationKind::Snow,
            PrecipitationKind::Mixed,
        ] {
            assert_eq!(PrecipitationKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(PrecipitationKind::try_from("hail").is_err());
    }
}
