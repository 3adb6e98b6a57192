//! Bucketing of raw readings into the categories the dashboard displays.
//!
//! All functions here are total: every finite input lands in exactly one bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UvCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UvCategory::Low => "Low",
            UvCategory::Moderate => "Moderate",
            UvCategory::High => "High",
            UvCategory::VeryHigh => "Very High",
            UvCategory::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for UvCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn uv_category(uv: f64) -> UvCategory {
    if uv >= 11.0 {
        UvCategory::Extreme
    } else if uv >= 8.0 {
        UvCategory::VeryHigh
    } else if uv >= 6.0 {
        UvCategory::High
    } else if uv >= 3.0 {
        UvCategory::Moderate
    } else {
        UvCategory::Low
    }
}

/// Category on the canonical AQI scale, where 100 is the cleanest air and 0 the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Excellent,
    Good,
    Moderate,
    Low,
    Poor,
}

impl AqiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AqiCategory::Excellent => "Excellent",
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Low => "Low",
            AqiCategory::Poor => "Poor",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn aqi_category(aqi: u8) -> AqiCategory {
    match aqi {
        80.. => AqiCategory::Excellent,
        60..=79 => AqiCategory::Good,
        40..=59 => AqiCategory::Moderate,
        20..=39 => AqiCategory::Low,
        _ => AqiCategory::Poor,
    }
}

/// Display colour for a canonical AQI value. An index of exactly 0 gets its own darker shade.
pub fn aqi_color_hex(aqi: u8) -> &'static str {
    match aqi {
        80.. => "#009E3A",
        60..=79 => "#84CF33",
        40..=59 => "#FFFE00",
        20..=39 => "#FF8C00",
        1..=19 => "#FF0000",
        0 => "#800000",
    }
}

/// Band on a "bad-high" provider scale (European AQI), where larger numbers mean dirtier air.
///
/// Only adapters see this scale; it never reaches the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderAqiBand {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    ExtremelyPoor,
}

impl fmt::Display for ProviderAqiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderAqiBand::Good => "Good",
            ProviderAqiBand::Fair => "Fair",
            ProviderAqiBand::Moderate => "Moderate",
            ProviderAqiBand::Poor => "Poor",
            ProviderAqiBand::VeryPoor => "Very Poor",
            ProviderAqiBand::ExtremelyPoor => "Extremely Poor",
        };
        f.write_str(s)
    }
}

pub fn provider_aqi_band(aqi: f64) -> ProviderAqiBand {
    if aqi <= 20.0 {
        ProviderAqiBand::Good
    } else if aqi <= 40.0 {
        ProviderAqiBand::Fair
    } else if aqi <= 60.0 {
        ProviderAqiBand::Moderate
    } else if aqi <= 80.0 {
        ProviderAqiBand::Poor
    } else if aqi <= 100.0 {
        ProviderAqiBand::VeryPoor
    } else {
        ProviderAqiBand::ExtremelyPoor
    }
}

/// Converts a bad-high reading onto the canonical good-high scale.
pub fn canonical_aqi_from_bad_high(aqi: f64) -> u8 {
    let clamped = aqi.clamp(0.0, 100.0);
    (100.0 - clamped).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollenCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

impl PollenCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollenCategory::Low => "Low",
            PollenCategory::Moderate => "Moderate",
            PollenCategory::High => "High",
            PollenCategory::VeryHigh => "Very High",
            PollenCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PollenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn pollen_category(value: f64) -> PollenCategory {
    if value >= 50.0 {
        PollenCategory::VeryHigh
    } else if value >= 35.0 {
        PollenCategory::High
    } else if value >= 20.0 {
        PollenCategory::Moderate
    } else {
        PollenCategory::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDescription {
    LightBreeze,
    ModerateWind,
    StrongWind,
    HighWind,
}

impl fmt::Display for WindDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WindDescription::LightBreeze => "Light breeze",
            WindDescription::ModerateWind => "Moderate wind",
            WindDescription::StrongWind => "Strong wind",
            WindDescription::HighWind => "High wind",
        };
        f.write_str(s)
    }
}

pub fn wind_description(speed_kmh: f64) -> WindDescription {
    if speed_kmh < 5.0 {
        WindDescription::LightBreeze
    } else if speed_kmh < 15.0 {
        WindDescription::ModerateWind
    } else if speed_kmh < 25.0 {
        WindDescription::StrongWind
    } else {
        WindDescription::HighWind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RainDescription {
    Low,
    Moderate,
    High,
}

impl fmt::Display for RainDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RainDescription::Low => "Low chance of rain",
            RainDescription::Moderate => "Moderate chance of rain",
            RainDescription::High => "High chance of rain",
        };
        f.write_str(s)
    }
}

pub fn rain_description(chance: f64) -> RainDescription {
    if chance < 30.0 {
        RainDescription::Low
    } else if chance < 70.0 {
        RainDescription::Moderate
    } else {
        RainDescription::High
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn compass_direction(degrees: f64) -> &'static str {
    let index = (degrees / 22.5).round().rem_euclid(16.0) as usize;
    COMPASS_POINTS[index % 16]
}

/// Heading an arrow glyph should point to: wind is reported by where it comes from.
pub fn wind_arrow_rotation(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0)
}

/// Temperatures are carried in Celsius; Fahrenheit is a display-time conversion.
pub fn convert_temp(celsius: f64, to_fahrenheit: bool) -> f64 {
    if to_fahrenheit {
        (celsius * 9.0 / 5.0 + 32.0).round()
    } else {
        celsius
    }
}
