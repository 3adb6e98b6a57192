use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    astro::MoonPhase,
    classify::PollenCategory,
    condition::Condition,
    error::WeatherError,
};

/// Latitude/longitude pair. This, not the display name, identifies a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::invalid(format!("latitude {latitude} is outside [-90, 90]")));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::invalid(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self { latitude, longitude })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Everything the dashboard shows for one location, built once per fetch cycle.
///
/// Temperatures are Celsius throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: Condition,
    pub description: String,
    pub location: String,
    pub coordinates: Coordinates,
    pub timezone: Tz,
    /// Today's local sunrise/sunset, reused for every hourly point.
    pub sunrise: String,
    pub sunset: String,
    pub today_forecast: DayRange,
    pub tomorrow_forecast: TomorrowForecast,
    pub details: Details,
    pub hourly_forecast: Vec<HourlyPoint>,
    pub daily_forecast: Vec<DailyPoint>,
    pub sea_data: Option<SeaData>,
    pub fetched_at: DateTime<Utc>,
    pub current_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRange {
    pub high: f64,
    pub low: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomorrowForecast {
    pub high: f64,
    pub low: f64,
    pub description: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: f64,
    pub uv_index: f64,
    pub uv_min: f64,
    pub uv_max: f64,
    pub humidity: f64,
    pub rain_chance: f64,
    pub air_quality: AirQualityRecord,
    pub pollen: PollenRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    /// Local wall-clock label in the preferred clock format.
    pub time_label: String,
    pub temperature: f64,
    pub condition: Condition,
    pub precip_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: Condition,
    pub precip_chance: f64,
    pub moon: Option<MoonState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoonState {
    pub phase: MoonPhase,
    pub illumination: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pollutants {
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub pm10: f64,
    pub pm25: f64,
}

impl Pollutants {
    /// Label of the highest concentration. Exact ties go to the earlier pollutant in
    /// CO, NO2, O3, PM10, PM2.5 order. `None` when nothing was measured.
    pub fn dominant(&self) -> Option<&'static str> {
        let readings = [
            ("CO", self.co),
            ("NO2", self.no2),
            ("O3", self.o3),
            ("PM10", self.pm10),
            ("PM2.5", self.pm25),
        ];

        let mut best: Option<(&'static str, f64)> = None;
        for (label, value) in readings {
            if value <= 0.0 {
                continue;
            }
            match best {
                Some((_, top)) if value <= top => {}
                _ => best = Some((label, value)),
            }
        }
        best.map(|(label, _)| label)
    }
}

pub const UNAVAILABLE: &str = "Unavailable";

/// Air quality on the canonical good-high scale (100 = cleanest).
///
/// `aqi == 0` with description [`UNAVAILABLE`] is the failure sentinel, not a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityRecord {
    pub aqi: u8,
    pub description: String,
    pub dominant_pollutant: String,
    pub pollutants: Pollutants,
}

impl AirQualityRecord {
    pub fn unavailable() -> Self {
        Self {
            aqi: 0,
            description: UNAVAILABLE.to_string(),
            dominant_pollutant: "N/A".to_string(),
            pollutants: Pollutants::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.description != UNAVAILABLE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollenReading {
    pub value: f64,
    pub category: PollenCategory,
    pub in_season: bool,
    pub recommendations: Vec<String>,
}

impl PollenReading {
    pub fn unknown() -> Self {
        Self {
            value: 0.0,
            category: PollenCategory::Unknown,
            in_season: false,
            recommendations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollenRecord {
    pub grass: PollenReading,
    pub tree: PollenReading,
    pub weed: PollenReading,
}

impl PollenRecord {
    pub fn unavailable() -> Self {
        Self {
            grass: PollenReading::unknown(),
            tree: PollenReading::unknown(),
            weed: PollenReading::unknown(),
        }
    }

    pub fn is_available(&self) -> bool {
        [&self.grass, &self.tree, &self.weed]
            .iter()
            .any(|r| r.category != PollenCategory::Unknown)
    }
}

/// Marine conditions for the current hour.
///
/// Present whenever the location had any marine data; `temperature` is 0 when only the
/// wave fields were reported, and `temperature_reported` tells the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeaData {
    pub temperature: f64,
    pub temperature_reported: bool,
    pub wave_height: Option<f64>,
    pub wave_direction: Option<f64>,
    pub wave_period: Option<f64>,
}
