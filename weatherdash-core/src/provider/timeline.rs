use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{astro::parse_timezone, model::Coordinates};

use super::{ForecastProvider, read_json};

/// Provider-neutral multi-day forecast: current conditions plus days, each with its hours.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub timezone: Tz,
    pub current: CurrentConditions,
    pub days: Vec<TimelineDay>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub conditions: String,
    pub humidity: f64,
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: f64,
    pub uv_index: f64,
    pub precip_chance: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub conditions: String,
    pub description: String,
    pub precip_chance: f64,
    pub uv_index: f64,
    /// Lunation fraction, 0 = new moon, 0.5 = full moon.
    pub moon_phase: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub hours: Vec<TimelineHour>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineHour {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub conditions: String,
    pub precip_chance: f64,
    pub uv_index: f64,
}

/// Visual Crossing timeline API, metric units.
#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    base_url: String,
    api_key: String,
    http: Client,
}

impl VisualCrossingProvider {
    pub fn new(base_url: impl Into<String>, api_key: String, http: Client) -> Self {
        Self { base_url: base_url.into(), api_key, http }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VcResponse {
    timezone: String,
    current_conditions: Option<VcCurrent>,
    #[serde(default)]
    days: Vec<VcDay>,
}

#[derive(Debug, Deserialize)]
struct VcCurrent {
    #[serde(rename = "datetimeEpoch")]
    datetime_epoch: i64,
    temp: f64,
    feelslike: Option<f64>,
    humidity: Option<f64>,
    windspeed: Option<f64>,
    winddir: Option<f64>,
    uvindex: Option<f64>,
    #[serde(default)]
    conditions: String,
    precipprob: Option<f64>,
    sunrise: Option<String>,
    sunset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VcDay {
    datetime: String,
    tempmax: f64,
    tempmin: f64,
    #[serde(default)]
    conditions: String,
    #[serde(default)]
    description: String,
    precipprob: Option<f64>,
    uvindex: Option<f64>,
    moonphase: Option<f64>,
    sunrise: Option<String>,
    sunset: Option<String>,
    #[serde(default)]
    hours: Vec<VcHour>,
}

#[derive(Debug, Deserialize)]
struct VcHour {
    #[serde(rename = "datetimeEpoch")]
    datetime_epoch: i64,
    temp: f64,
    #[serde(default)]
    conditions: String,
    precipprob: Option<f64>,
    uvindex: Option<f64>,
}

fn epoch_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("timestamp {ts} is out of range"))
}

fn normalize(parsed: VcResponse) -> Result<Timeline> {
    let timezone = parse_timezone(&parsed.timezone)
        .context("Visual Crossing returned an unusable time zone")?;

    let current = parsed
        .current_conditions
        .ok_or_else(|| anyhow!("Visual Crossing response contained no current conditions"))?;

    let current = CurrentConditions {
        time: epoch_to_utc(current.datetime_epoch)?,
        temperature: current.temp,
        feels_like: current.feelslike.unwrap_or(current.temp),
        conditions: current.conditions,
        humidity: current.humidity.unwrap_or(0.0),
        wind_speed_kmh: current.windspeed.unwrap_or(0.0),
        wind_direction_deg: current.winddir.unwrap_or(0.0),
        uv_index: current.uvindex.unwrap_or(0.0),
        precip_chance: current.precipprob,
        sunrise: current.sunrise,
        sunset: current.sunset,
    };

    let days = parsed
        .days
        .into_iter()
        .map(|day| {
            let date = NaiveDate::parse_from_str(&day.datetime, "%Y-%m-%d").with_context(|| {
                format!("Visual Crossing day has a malformed date '{}'", day.datetime)
            })?;

            let hours = day
                .hours
                .into_iter()
                .map(|hour| {
                    Ok(TimelineHour {
                        time: epoch_to_utc(hour.datetime_epoch)?,
                        temperature: hour.temp,
                        conditions: hour.conditions,
                        precip_chance: hour.precipprob.unwrap_or(0.0),
                        uv_index: hour.uvindex.unwrap_or(0.0),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(TimelineDay {
                date,
                high: day.tempmax,
                low: day.tempmin,
                conditions: day.conditions,
                description: day.description,
                precip_chance: day.precipprob.unwrap_or(0.0),
                uv_index: day.uvindex.unwrap_or(0.0),
                moon_phase: day.moonphase,
                sunrise: day.sunrise,
                sunset: day.sunset,
                hours,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Timeline { timezone, current, days })
}

#[async_trait]
impl ForecastProvider for VisualCrossingProvider {
    async fn timeline(&self, coords: Coordinates) -> Result<Timeline> {
        let url = format!("{}/{},{}", self.base_url, coords.latitude, coords.longitude);
        debug!(%url, "fetching forecast timeline");

        let request = self.http.get(&url).query(&[
            ("unitGroup", "metric"),
            ("include", "current,days,hours"),
            ("contentType", "json"),
            ("key", self.api_key.as_str()),
        ]);

        let parsed: VcResponse = read_json(request, "Visual Crossing (timeline)").await?;
        normalize(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "latitude": 52.37,
            "longitude": 4.89,
            "timezone": "Europe/Amsterdam",
            "currentConditions": {
                "datetime": "14:00:00",
                "datetimeEpoch": 1_717_243_200,
                "temp": 18.4,
                "feelslike": 17.9,
                "humidity": 71.2,
                "windspeed": 14.8,
                "winddir": 240.0,
                "uvindex": 4.0,
                "conditions": "Partially cloudy",
                "precipprob": null,
                "sunrise": "05:23:10",
                "sunset": "21:53:40"
            },
            "days": [
                {
                    "datetime": "2024-06-01",
                    "datetimeEpoch": 1_717_192_800,
                    "tempmax": 20.1,
                    "tempmin": 12.3,
                    "conditions": "Rain, Partially cloudy",
                    "description": "Partly cloudy with afternoon rain.",
                    "precipprob": 64.5,
                    "uvindex": 6.0,
                    "moonphase": 0.84,
                    "sunrise": "05:23:10",
                    "sunset": "21:53:40",
                    "hours": [
                        { "datetime": "00:00:00", "datetimeEpoch": 1_717_192_800, "temp": 13.0,
                          "conditions": "Clear", "precipprob": 0.0, "uvindex": 0.0 },
                        { "datetime": "01:00:00", "datetimeEpoch": 1_717_196_400, "temp": 12.7,
                          "conditions": "Clear", "precipprob": null, "uvindex": null }
                    ]
                },
                {
                    "datetime": "2024-06-02",
                    "tempmax": 22.0,
                    "tempmin": 11.0,
                    "conditions": "Clear",
                    "moonphase": null
                }
            ]
        })
    }

    #[test]
    fn normalizes_a_timeline() {
        let parsed: VcResponse = serde_json::from_value(sample()).unwrap();
        let timeline = normalize(parsed).expect("sample must normalize");

        assert_eq!(timeline.timezone, chrono_tz::Europe::Amsterdam);
        assert_eq!(timeline.current.temperature, 18.4);
        assert_eq!(timeline.current.precip_chance, None);
        assert_eq!(timeline.current.sunrise.as_deref(), Some("05:23:10"));

        assert_eq!(timeline.days.len(), 2);
        let today = &timeline.days[0];
        assert_eq!(today.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(today.moon_phase, Some(0.84));
        assert_eq!(today.hours.len(), 2);
        assert_eq!(today.hours[1].precip_chance, 0.0);
        assert_eq!(today.hours[1].time.timestamp(), 1_717_196_400);

        let tomorrow = &timeline.days[1];
        assert!(tomorrow.hours.is_empty());
        assert_eq!(tomorrow.description, "");
        assert_eq!(tomorrow.moon_phase, None);
    }

    #[test]
    fn missing_current_conditions_is_an_error() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("currentConditions");
        let parsed: VcResponse = serde_json::from_value(value).unwrap();

        let err = normalize(parsed).unwrap_err();
        assert!(err.to_string().contains("no current conditions"));
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        let mut value = sample();
        value["timezone"] = json!("Nowhere/Special");
        let parsed: VcResponse = serde_json::from_value(value).unwrap();

        assert!(normalize(parsed).is_err());
    }

    #[test]
    fn malformed_day_date_is_an_error() {
        let mut value = sample();
        value["days"][1]["datetime"] = json!("June 2nd");
        let parsed: VcResponse = serde_json::from_value(value).unwrap();

        let err = normalize(parsed).unwrap_err();
        assert!(format!("{err:#}").contains("June 2nd"));
    }
}
