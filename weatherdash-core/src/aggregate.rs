//! Builds a [`WeatherSnapshot`] from all collaborators in one fetch cycle.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    astro::{moon_illumination, moon_phase_name},
    condition::{DayNight, map_condition},
    config::Config,
    error::WeatherError,
    model::{
        AirQualityRecord, Coordinates, DailyPoint, DayRange, Details, HourlyPoint, MoonState,
        PollenRecord, SeaData, TomorrowForecast, WeatherSnapshot,
    },
    provider::{
        self, AirQualityProvider, AirQualitySource, ForecastProvider, Geocoder, MarineProvider,
        PlaceCandidate, PollenProvider, ProviderId, Timeline, TimelineDay,
        air_quality::{GoogleAirQualityProvider, OpenMeteoAirQualityProvider},
        geocode::{self, NominatimGeocoder},
        marine::{self, OpenMeteoMarineProvider},
        pollen::{self, GooglePollenProvider, UnconfiguredPollenProvider},
        timeline::VisualCrossingProvider,
    },
};

const HOURLY_WINDOW: usize = 24;
const DAILY_WINDOW: usize = 7;

/// Owns one instance of every collaborator. Cheap to share; holds no per-fetch state.
#[derive(Debug, Clone)]
pub struct Aggregator {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastProvider>,
    air_quality: Arc<dyn AirQualityProvider>,
    pollen: Arc<dyn PollenProvider>,
    marine: Arc<dyn MarineProvider>,
}

impl Aggregator {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastProvider>,
        air_quality: Arc<dyn AirQualityProvider>,
        pollen: Arc<dyn PollenProvider>,
        marine: Arc<dyn MarineProvider>,
    ) -> Self {
        Self { geocoder, forecast, air_quality, pollen, marine }
    }

    /// Wires the HTTP collaborators described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = provider::http_client(config)?;
        let endpoints = &config.endpoints;

        let forecast_key = config.require_api_key(ProviderId::VisualCrossing)?.to_owned();
        let google_key = config.provider_api_key(ProviderId::Google).map(str::to_owned);

        let air_quality: Arc<dyn AirQualityProvider> = match config.air_quality_source {
            AirQualitySource::Google => Arc::new(GoogleAirQualityProvider::new(
                endpoints.google_air_quality.as_str(),
                config.require_api_key(ProviderId::Google)?.to_owned(),
                http.clone(),
            )),
            AirQualitySource::OpenMeteo => Arc::new(OpenMeteoAirQualityProvider::new(
                endpoints.open_meteo_air_quality.as_str(),
                http.clone(),
            )),
        };

        let pollen: Arc<dyn PollenProvider> = match google_key {
            Some(key) => Arc::new(GooglePollenProvider::new(
                endpoints.pollen.as_str(),
                key,
                http.clone(),
            )),
            None => {
                warn!("no google API key configured, pollen will be unavailable");
                Arc::new(UnconfiguredPollenProvider)
            }
        };

        Ok(Self::new(
            Arc::new(NominatimGeocoder::new(endpoints.geocoding.as_str(), http.clone())),
            Arc::new(VisualCrossingProvider::new(
                endpoints.timeline.as_str(),
                forecast_key,
                http.clone(),
            )),
            air_quality,
            pollen,
            Arc::new(OpenMeteoMarineProvider::new(endpoints.marine.as_str(), http)),
        ))
    }

    /// The single entry point: everything the dashboard shows for one location, now.
    pub async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        use_24_hour_clock: bool,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let coords = Coordinates::new(latitude, longitude)?;
        self.fetch_at(coords, use_24_hour_clock, Utc::now()).await
    }

    /// Same as [`Aggregator::fetch`] with an explicit "now".
    pub async fn fetch_at(
        &self,
        coords: Coordinates,
        use_24_hour_clock: bool,
        now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        debug!(lat = coords.latitude, lon = coords.longitude, "starting fetch cycle");

        let (location, timeline, air_quality, pollen, sea_data) = tokio::join!(
            geocode::locate(self.geocoder.as_ref(), coords),
            self.forecast.timeline(coords),
            provider::air_quality::fetch_or_unavailable(self.air_quality.as_ref(), coords),
            pollen::fetch_or_unavailable(self.pollen.as_ref(), coords),
            marine::fetch_or_absent(self.marine.as_ref(), coords, now),
        );

        let fetch_error = |source: anyhow::Error| WeatherError::Fetch {
            latitude: coords.latitude,
            longitude: coords.longitude,
            source,
        };

        let gathered = Gathered {
            location,
            timeline: timeline.map_err(fetch_error)?,
            air_quality,
            pollen,
            sea_data,
        };
        let snapshot = assemble(coords, gathered, use_24_hour_clock, now).map_err(fetch_error)?;

        info!(
            location = %snapshot.location,
            hourly = snapshot.hourly_forecast.len(),
            daily = snapshot.daily_forecast.len(),
            sea = snapshot.sea_data.is_some(),
            "weather snapshot assembled"
        );
        Ok(snapshot)
    }

    /// Forward geocoding for the location picker.
    pub async fn search_places(&self, query: &str) -> Result<Vec<PlaceCandidate>> {
        self.geocoder.search(query).await
    }
}

struct Gathered {
    location: String,
    timeline: Timeline,
    air_quality: AirQualityRecord,
    pollen: PollenRecord,
    sea_data: Option<SeaData>,
}

fn time_label(instant: DateTime<Utc>, timezone: Tz, use_24_hour_clock: bool) -> String {
    let local = instant.with_timezone(&timezone);
    if use_24_hour_clock {
        local.format("%H:%M").to_string()
    } else {
        local.format("%-I %p").to_string()
    }
}

fn moon_state(day: &TimelineDay) -> Option<MoonState> {
    let fraction = day.moon_phase?;
    match (moon_phase_name(fraction), moon_illumination(fraction)) {
        (Ok(phase), Ok(illumination)) => Some(MoonState { phase, illumination }),
        (Err(err), _) | (_, Err(err)) => {
            debug!(date = %day.date, error = %err, "skipping moon phase");
            None
        }
    }
}

/// Pure assembly step. Today's sunrise/sunset pair is applied to every hourly point,
/// including the hours that belong to tomorrow.
fn assemble(
    coords: Coordinates,
    gathered: Gathered,
    use_24_hour_clock: bool,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot> {
    let Gathered { location, timeline, air_quality, pollen, sea_data } = gathered;
    let Timeline { timezone, current, days } = timeline;

    let (today, tomorrow) = match days.as_slice() {
        [today, tomorrow, ..] => (today, tomorrow),
        _ => return Err(anyhow!("forecast timeline has {} day(s), need at least 2", days.len())),
    };

    let sunrise = current.sunrise.clone().or_else(|| today.sunrise.clone());
    let sunset = current.sunset.clone().or_else(|| today.sunset.clone());
    let day_night = |instant: DateTime<Utc>| match (sunrise.as_deref(), sunset.as_deref()) {
        (Some(sunrise), Some(sunset)) => Some(DayNight { instant, sunrise, sunset, timezone }),
        _ => None,
    };

    let condition = map_condition(&current.conditions, day_night(current.time).as_ref());

    let mut upcoming: Vec<_> = today
        .hours
        .iter()
        .chain(tomorrow.hours.iter())
        .filter(|h| h.time >= now)
        .collect();
    upcoming.sort_by_key(|h| h.time);
    upcoming.truncate(HOURLY_WINDOW);

    let hourly_forecast = upcoming
        .into_iter()
        .map(|h| HourlyPoint {
            timestamp: h.time,
            time_label: time_label(h.time, timezone, use_24_hour_clock),
            temperature: h.temperature,
            condition: map_condition(&h.conditions, day_night(h.time).as_ref()),
            precip_chance: h.precip_chance,
        })
        .collect();

    let (uv_min, uv_max) = today
        .hours
        .iter()
        .map(|h| h.uv_index)
        .fold(None, |acc: Option<(f64, f64)>, uv| match acc {
            Some((lo, hi)) => Some((lo.min(uv), hi.max(uv))),
            None => Some((uv, uv)),
        })
        .unwrap_or((today.uv_index.min(current.uv_index), today.uv_index.max(current.uv_index)));

    let daily_forecast = days
        .iter()
        .skip(2)
        .take(DAILY_WINDOW)
        .map(|day| DailyPoint {
            date: day.date,
            high: day.high,
            low: day.low,
            condition: map_condition(&day.conditions, None),
            precip_chance: day.precip_chance,
            moon: moon_state(day),
        })
        .collect();

    let tomorrow_description = if tomorrow.description.trim().is_empty() {
        tomorrow.conditions.clone()
    } else {
        tomorrow.description.clone()
    };

    Ok(WeatherSnapshot {
        temperature: current.temperature,
        feels_like: current.feels_like,
        condition,
        description: current.conditions.clone(),
        location,
        coordinates: coords,
        timezone,
        sunrise: sunrise.clone().unwrap_or_default(),
        sunset: sunset.clone().unwrap_or_default(),
        today_forecast: DayRange { high: today.high, low: today.low },
        tomorrow_forecast: TomorrowForecast {
            high: tomorrow.high,
            low: tomorrow.low,
            description: tomorrow_description,
            condition: map_condition(&tomorrow.conditions, None),
        },
        details: Details {
            wind_speed_kmh: current.wind_speed_kmh,
            wind_direction_deg: current.wind_direction_deg,
            uv_index: current.uv_index,
            uv_min,
            uv_max,
            humidity: current.humidity,
            rain_chance: current.precip_chance.unwrap_or(today.precip_chance),
            air_quality,
            pollen,
        },
        hourly_forecast,
        daily_forecast,
        sea_data,
        fetched_at: now,
        current_date: now.with_timezone(&timezone).date_naive(),
    })
}
