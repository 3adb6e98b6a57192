//! Air-quality adapters. Every backend's reading is converted onto the canonical
//! good-high scale (100 = cleanest) before it leaves this module.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    classify::{aqi_category, canonical_aqi_from_bad_high, provider_aqi_band},
    model::{AirQualityRecord, Coordinates, Pollutants},
};

use super::{AirQualityProvider, read_json};

/// Runs the lookup and substitutes [`AirQualityRecord::unavailable`] on any failure.
pub async fn fetch_or_unavailable(
    provider: &dyn AirQualityProvider,
    coords: Coordinates,
) -> AirQualityRecord {
    match provider.air_quality(coords).await {
        Ok(record) => record,
        Err(err) => {
            warn!(
                lat = coords.latitude,
                lon = coords.longitude,
                error = ?err,
                "air quality unavailable"
            );
            AirQualityRecord::unavailable()
        }
    }
}

fn record(aqi: u8, pollutants: Pollutants, fallback_dominant: Option<&str>) -> AirQualityRecord {
    let dominant_pollutant = pollutants
        .dominant()
        .map(str::to_string)
        .or_else(|| fallback_dominant.map(pollutant_label))
        .unwrap_or_else(|| "N/A".to_string());

    AirQualityRecord {
        aqi,
        description: aqi_category(aqi).to_string(),
        dominant_pollutant,
        pollutants,
    }
}

fn pollutant_label(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "pm25" | "pm2_5" => "PM2.5".to_string(),
        other => other.to_uppercase(),
    }
}

/// Google Air Quality, universal AQI. Already good-high.
#[derive(Debug, Clone)]
pub struct GoogleAirQualityProvider {
    base_url: String,
    api_key: String,
    http: Client,
}

impl GoogleAirQualityProvider {
    pub fn new(base_url: impl Into<String>, api_key: String, http: Client) -> Self {
        Self { base_url: base_url.into(), api_key, http }
    }
}

#[derive(Debug, Deserialize)]
struct GaqResponse {
    #[serde(default)]
    indexes: Vec<GaqIndex>,
    #[serde(default)]
    pollutants: Vec<GaqPollutant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GaqIndex {
    aqi: i64,
    dominant_pollutant: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GaqPollutant {
    code: String,
    concentration: Option<GaqConcentration>,
}

#[derive(Debug, Deserialize)]
struct GaqConcentration {
    value: f64,
}

fn normalize_google(parsed: GaqResponse) -> Result<AirQualityRecord> {
    let index = parsed
        .indexes
        .first()
        .ok_or_else(|| anyhow!("Google air quality response contained no index"))?;

    let mut pollutants = Pollutants::default();
    for p in &parsed.pollutants {
        let Some(value) = p.concentration.as_ref().map(|c| c.value) else {
            continue;
        };
        match p.code.to_lowercase().as_str() {
            "co" => pollutants.co = value,
            "no2" => pollutants.no2 = value,
            "o3" => pollutants.o3 = value,
            "pm10" => pollutants.pm10 = value,
            "pm25" => pollutants.pm25 = value,
            _ => {}
        }
    }

    let aqi = index.aqi.clamp(0, 100) as u8;
    Ok(record(aqi, pollutants, index.dominant_pollutant.as_deref()))
}

#[async_trait]
impl AirQualityProvider for GoogleAirQualityProvider {
    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityRecord> {
        let url = format!("{}/currentConditions:lookup", self.base_url);
        debug!(%url, "fetching air quality (google)");

        let body = json!({
            "location": { "latitude": coords.latitude, "longitude": coords.longitude },
            "extraComputations": ["POLLUTANT_CONCENTRATION"],
        });

        let request = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body);

        let parsed: GaqResponse = read_json(request, "Google Air Quality").await?;
        normalize_google(parsed)
    }
}

/// Open-Meteo air quality, European AQI. Bad-high: converted at this boundary.
#[derive(Debug, Clone)]
pub struct OpenMeteoAirQualityProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoAirQualityProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct OmAqResponse {
    current: Option<OmAqCurrent>,
}

#[derive(Debug, Deserialize)]
struct OmAqCurrent {
    european_aqi: Option<f64>,
    carbon_monoxide: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    ozone: Option<f64>,
    pm10: Option<f64>,
    pm2_5: Option<f64>,
}

fn normalize_open_meteo(parsed: OmAqResponse) -> Result<AirQualityRecord> {
    let current = parsed
        .current
        .ok_or_else(|| anyhow!("Open-Meteo air quality response contained no current block"))?;
    let eaqi = current
        .european_aqi
        .ok_or_else(|| anyhow!("Open-Meteo air quality response contained no european_aqi"))?;

    let aqi = canonical_aqi_from_bad_high(eaqi);
    debug!(eaqi, band = %provider_aqi_band(eaqi), aqi, "converted european AQI");

    let pollutants = Pollutants {
        co: current.carbon_monoxide.unwrap_or(0.0),
        no2: current.nitrogen_dioxide.unwrap_or(0.0),
        o3: current.ozone.unwrap_or(0.0),
        pm10: current.pm10.unwrap_or(0.0),
        pm25: current.pm2_5.unwrap_or(0.0),
    };

    Ok(record(aqi, pollutants, None))
}

#[async_trait]
impl AirQualityProvider for OpenMeteoAirQualityProvider {
    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityRecord> {
        let url = format!("{}/air-quality", self.base_url);
        debug!(%url, "fetching air quality (open-meteo)");

        let request = self.http.get(&url).query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            (
                "current",
                "european_aqi,carbon_monoxide,nitrogen_dioxide,ozone,pm10,pm2_5".to_string(),
            ),
        ]);

        let parsed: OmAqResponse = read_json(request, "Open-Meteo air quality").await?;
        normalize_open_meteo(parsed)
    }
}
