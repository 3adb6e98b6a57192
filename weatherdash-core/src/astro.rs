//! Day/night classification and moon-phase derivation.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WeatherError;

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Parses a local time-of-day string such as `"06:42:10"`, `"20:15"` or `"7:05 AM"`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, WeatherError> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| WeatherError::invalid(format!("unrecognised time of day '{value}'")))
}

pub fn parse_timezone(name: &str) -> Result<Tz, WeatherError> {
    name.parse::<Tz>()
        .map_err(|_| WeatherError::invalid(format!("unknown time zone '{name}'")))
}

fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Whether `instant` falls outside the sunrise..=sunset window of the location's local day.
///
/// Sunrise and sunset are time-of-day strings applied to the same calendar date as the
/// converted instant. The exact sunrise and sunset minutes count as day. There is no
/// polar-day or polar-night handling: inverted or equal strings are compared as given.
pub fn is_nighttime(
    instant: DateTime<Utc>,
    sunrise: &str,
    sunset: &str,
    timezone: Tz,
) -> Result<bool, WeatherError> {
    let local = instant.with_timezone(&timezone);
    let current = local.hour() * 60 + local.minute();
    let sunrise = minutes_since_midnight(parse_time_of_day(sunrise)?);
    let sunset = minutes_since_midnight(parse_time_of_day(sunset)?);

    Ok(current < sunrise || current > sunset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check_fraction(fraction: f64) -> Result<f64, WeatherError> {
    if (0.0..1.0).contains(&fraction) {
        Ok(fraction)
    } else {
        Err(WeatherError::invalid(format!(
            "moon phase fraction {fraction} is outside [0, 1)"
        )))
    }
}

/// Names the phase for a lunation fraction: 0 new, 0.25 first quarter, 0.5 full,
/// 0.75 last quarter. Only those exact values name a quarter.
pub fn moon_phase_name(fraction: f64) -> Result<MoonPhase, WeatherError> {
    let f = check_fraction(fraction)?;

    let phase = if f == 0.0 {
        MoonPhase::NewMoon
    } else if f < 0.25 {
        MoonPhase::WaxingCrescent
    } else if f == 0.25 {
        MoonPhase::FirstQuarter
    } else if f < 0.5 {
        MoonPhase::WaxingGibbous
    } else if f == 0.5 {
        MoonPhase::FullMoon
    } else if f < 0.75 {
        MoonPhase::WaningGibbous
    } else if f == 0.75 {
        MoonPhase::LastQuarter
    } else {
        MoonPhase::WaningCrescent
    };

    Ok(phase)
}

/// Illuminated share of the disc in percent.
///
/// This is a triangular approximation (linear up to full moon and back down), not the
/// cosine-shaped curve of the real illumination.
pub fn moon_illumination(fraction: f64) -> Result<u8, WeatherError> {
    let f = check_fraction(fraction)?;
    let lit = if f < 0.5 { f * 2.0 } else { (1.0 - f) * 2.0 };
    Ok((lit * 100.0).round() as u8)
}
