use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{Coordinates, SeaData};

use super::{MarineProvider, read_json};

/// Runs the lookup; any failure means the location simply has no sea data.
pub async fn fetch_or_absent(
    provider: &dyn MarineProvider,
    coords: Coordinates,
    now: DateTime<Utc>,
) -> Option<SeaData> {
    match provider.sea(coords, now).await {
        Ok(sea) => sea,
        Err(err) => {
            warn!(
                lat = coords.latitude,
                lon = coords.longitude,
                error = ?err,
                "marine data unavailable"
            );
            None
        }
    }
}

/// Open-Meteo marine forecast.
#[derive(Debug, Clone)]
pub struct OpenMeteoMarineProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoMarineProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct OmMarineResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: Option<OmHourly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: Vec<String>,
    sea_surface_temperature: Vec<Option<f64>>,
    wave_height: Vec<Option<f64>>,
    wave_direction: Vec<Option<f64>>,
    wave_period: Vec<Option<f64>>,
}

fn at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

/// Picks the sample whose local hour-of-day equals the current local hour.
fn normalize(parsed: OmMarineResponse, now: DateTime<Utc>) -> Option<SeaData> {
    let hourly = parsed.hourly?;
    let offset = FixedOffset::east_opt(parsed.utc_offset_seconds).unwrap_or(Utc.fix());
    let current_hour = now.with_timezone(&offset).hour();

    let index = hourly.time.iter().position(|t| {
        NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M")
            .map(|ts| ts.hour() == current_hour)
            .unwrap_or(false)
    });
    let Some(index) = index else {
        debug!(current_hour, "no marine sample for the current hour");
        return None;
    };

    let temperature = at(&hourly.sea_surface_temperature, index);
    let wave_height = at(&hourly.wave_height, index);
    if temperature.is_none() && wave_height.is_none() {
        return None;
    }

    Some(SeaData {
        temperature: temperature.unwrap_or(0.0),
        temperature_reported: temperature.is_some(),
        wave_height,
        wave_direction: at(&hourly.wave_direction, index),
        wave_period: at(&hourly.wave_period, index),
    })
}

#[async_trait]
impl MarineProvider for OpenMeteoMarineProvider {
    async fn sea(&self, coords: Coordinates, now: DateTime<Utc>) -> Result<Option<SeaData>> {
        let url = format!("{}/marine", self.base_url);
        debug!(%url, "fetching marine forecast");

        let request = self.http.get(&url).query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            (
                "hourly",
                "sea_surface_temperature,wave_height,wave_direction,wave_period".to_string(),
            ),
            ("timezone", "auto".to_string()),
            ("forecast_days", "1".to_string()),
        ]);

        let parsed: OmMarineResponse = read_json(request, "Open-Meteo marine").await?;
        Ok(normalize(parsed, now))
    }
}
