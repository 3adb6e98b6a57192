//! Maps free-text provider conditions onto the dashboard's closed set.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::astro::is_nighttime;

/// Canonical weather condition.
///
/// `Sunny` and `Clear` are the same clear sky, told apart only by day and night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Sunny,
    Clear,
    Rainy,
    Icy,
    Cloudy,
    Windy,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "sunny",
            Condition::Clear => "clear",
            Condition::Rainy => "rainy",
            Condition::Icy => "icy",
            Condition::Cloudy => "cloudy",
            Condition::Windy => "windy",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-point context needed to split clear skies into day and night.
#[derive(Debug, Clone, Copy)]
pub struct DayNight<'a> {
    pub instant: DateTime<Utc>,
    pub sunrise: &'a str,
    pub sunset: &'a str,
    pub timezone: Tz,
}

// Order matters: the first group with a matching keyword wins.
const KEYWORD_GROUPS: &[(&[&str], Condition)] = &[
    (&["clear", "sun"], Condition::Sunny),
    (&["rain", "drizzle", "thunder"], Condition::Rainy),
    (&["snow", "ice", "sleet"], Condition::Icy),
    (&["cloud", "overcast"], Condition::Cloudy),
    (&["wind"], Condition::Windy),
];

/// Maps `raw` onto a [`Condition`].
///
/// Pass the forecast point's own [`DayNight`] context; without it a clear sky is `Sunny`.
/// Unmatched text defaults to `Sunny`.
pub fn map_condition(raw: &str, day_night: Option<&DayNight<'_>>) -> Condition {
    let text = raw.to_lowercase();

    let matched = KEYWORD_GROUPS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, condition)| *condition);

    match matched {
        Some(Condition::Sunny) => {}
        Some(other) => return other,
        None => return Condition::Sunny,
    }

    match day_night {
        Some(ctx) => match is_nighttime(ctx.instant, ctx.sunrise, ctx.sunset, ctx.timezone) {
            Ok(true) => Condition::Clear,
            Ok(false) => Condition::Sunny,
            Err(err) => {
                debug!(error = %err, raw, "could not judge day/night, assuming day");
                Condition::Sunny
            }
        },
        None => Condition::Sunny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn amsterdam() -> Tz {
        "Europe/Amsterdam".parse().unwrap()
    }

    #[test]
    fn keyword_groups() {
        assert_eq!(map_condition("light rain showers", None), Condition::Rainy);
        assert_eq!(map_condition("Thunderstorm", None), Condition::Rainy);
        assert_eq!(map_condition("Drizzle", None), Condition::Rainy);
        assert_eq!(map_condition("Snow", None), Condition::Icy);
        assert_eq!(map_condition("Freezing sleet", None), Condition::Icy);
        assert_eq!(map_condition("Overcast", None), Condition::Cloudy);
        assert_eq!(map_condition("Partially cloudy", None), Condition::Cloudy);
        assert_eq!(map_condition("Wind", None), Condition::Windy);
        assert_eq!(map_condition("Sunny", None), Condition::Sunny);
    }

    #[test]
    fn first_group_wins() {
        // "Rain, Partially cloudy" hits both the rain and cloud groups.
        assert_eq!(map_condition("Rain, Partially cloudy", None), Condition::Rainy);
        assert_eq!(map_condition("Clearing skies after rain", None), Condition::Sunny);
    }

    #[test]
    fn unmatched_text_defaults_to_sunny() {
        assert_eq!(map_condition("Fog", None), Condition::Sunny);
        assert_eq!(map_condition("", None), Condition::Sunny);
    }

    #[test]
    fn unmatched_text_ignores_day_night() {
        let utc: Tz = "UTC".parse().unwrap();
        let ctx = DayNight {
            instant: Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap(),
            sunrise: "06:00",
            sunset: "20:00",
            timezone: utc,
        };
        assert_eq!(map_condition("Fog", Some(&ctx)), Condition::Sunny);
        assert_eq!(map_condition("Haze", Some(&ctx)), Condition::Sunny);
        assert_eq!(map_condition("", Some(&ctx)), Condition::Sunny);
        assert_eq!(map_condition("Clear", Some(&ctx)), Condition::Clear);
    }

    #[test]
    fn clear_sky_depends_on_the_point_time() {
        let tz = amsterdam();
        // 22:00 local
        let night = DayNight {
            instant: Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
            sunrise: "06:00",
            sunset: "20:00",
            timezone: tz,
        };
        // 12:00 local
        let noon = DayNight {
            instant: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            ..night
        };

        assert_eq!(map_condition("clear", Some(&night)), Condition::Clear);
        assert_eq!(map_condition("clear", Some(&noon)), Condition::Sunny);
    }

    #[test]
    fn day_night_is_ignored_for_other_conditions() {
        let night = DayNight {
            instant: Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap(),
            sunrise: "06:00",
            sunset: "20:00",
            timezone: amsterdam(),
        };
        assert_eq!(map_condition("Rain", Some(&night)), Condition::Rainy);
    }

    #[test]
    fn unparsable_sun_times_fall_back_to_day() {
        let ctx = DayNight {
            instant: Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap(),
            sunrise: "",
            sunset: "",
            timezone: amsterdam(),
        };
        assert_eq!(map_condition("Clear", Some(&ctx)), Condition::Sunny);
    }
}
