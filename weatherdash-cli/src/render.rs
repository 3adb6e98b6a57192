//! Plain-text rendering of a [`WeatherSnapshot`].

use std::fmt::{self, Write};

use weatherdash_core::{
    WeatherSnapshot,
    classify::{
        aqi_color_hex, compass_direction, convert_temp, rain_description, uv_category,
        wind_arrow_rotation, wind_description,
    },
    model::{Details, PollenReading, SeaData},
};

fn temp(celsius: f64, fahrenheit: bool) -> String {
    let unit = if fahrenheit { "F" } else { "C" };
    format!("{:.0}°{unit}", convert_temp(celsius, fahrenheit))
}

/// Writes the whole dashboard into `out`.
pub fn snapshot(out: &mut impl Write, s: &WeatherSnapshot, fahrenheit: bool) -> fmt::Result {
    let local_fetch = s.fetched_at.with_timezone(&s.timezone);

    writeln!(out, "{}  ({})", s.location, s.coordinates)?;
    writeln!(
        out,
        "{}  updated {}",
        s.current_date.format("%A %-d %B %Y"),
        local_fetch.format("%H:%M %Z")
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "{} {}, feels like {}",
        temp(s.temperature, fahrenheit),
        s.description,
        temp(s.feels_like, fahrenheit)
    )?;
    writeln!(
        out,
        "Today {} / {}   Sunrise {}  Sunset {}",
        temp(s.today_forecast.high, fahrenheit),
        temp(s.today_forecast.low, fahrenheit),
        s.sunrise,
        s.sunset
    )?;
    writeln!(
        out,
        "Tomorrow {} / {}  {}",
        temp(s.tomorrow_forecast.high, fahrenheit),
        temp(s.tomorrow_forecast.low, fahrenheit),
        s.tomorrow_forecast.description
    )?;
    writeln!(out)?;

    details(out, &s.details)?;
    if let Some(sea) = &s.sea_data {
        sea_line(out, sea, fahrenheit)?;
    }

    if !s.hourly_forecast.is_empty() {
        writeln!(out)?;
        writeln!(out, "Next hours")?;
        for h in &s.hourly_forecast {
            writeln!(
                out,
                "  {:>6}  {:>5}  {:<7} {:>3.0}%",
                h.time_label,
                temp(h.temperature, fahrenheit),
                h.condition.as_str(),
                h.precip_chance
            )?;
        }
    }

    if !s.daily_forecast.is_empty() {
        writeln!(out)?;
        writeln!(out, "Coming days")?;
        for day in &s.daily_forecast {
            let moon = day
                .moon
                .map(|m| format!("{} {}%", m.phase, m.illumination))
                .unwrap_or_default();
            writeln!(
                out,
                "  {}  {:>5} / {:<5} {:<7} {:>3.0}%  {moon}",
                day.date.format("%a %d %b"),
                temp(day.high, fahrenheit),
                temp(day.low, fahrenheit),
                day.condition.as_str(),
                day.precip_chance
            )?;
        }
    }

    Ok(())
}

fn details(out: &mut impl Write, d: &Details) -> fmt::Result {
    writeln!(
        out,
        "Wind      {:.0} km/h {} (arrow {:.0}°), {}",
        d.wind_speed_kmh,
        compass_direction(d.wind_direction_deg),
        wind_arrow_rotation(d.wind_direction_deg),
        wind_description(d.wind_speed_kmh)
    )?;
    writeln!(
        out,
        "UV        {:.0} {} (today {:.0}-{:.0})",
        d.uv_index,
        uv_category(d.uv_index),
        d.uv_min,
        d.uv_max
    )?;
    writeln!(out, "Humidity  {:.0}%", d.humidity)?;
    writeln!(out, "Rain      {:.0}% {}", d.rain_chance, rain_description(d.rain_chance))?;

    let aq = &d.air_quality;
    if aq.is_available() {
        writeln!(
            out,
            "Air       {} {} [{}], mostly {}",
            aq.aqi,
            aq.description,
            aqi_color_hex(aq.aqi),
            aq.dominant_pollutant
        )?;
    } else {
        writeln!(out, "Air       {}", aq.description)?;
    }

    if d.pollen.is_available() {
        writeln!(out, "Pollen")?;
        pollen_line(out, "Grass", &d.pollen.grass)?;
        pollen_line(out, "Tree", &d.pollen.tree)?;
        pollen_line(out, "Weed", &d.pollen.weed)?;
    } else {
        writeln!(out, "Pollen    Unavailable")?;
    }

    Ok(())
}

fn pollen_line(out: &mut impl Write, kind: &str, reading: &PollenReading) -> fmt::Result {
    let season = if reading.in_season { "in season" } else { "out of season" };
    writeln!(out, "  {kind:<6} {:<10} ({season})", reading.category.as_str())?;
    if let Some(tip) = reading.recommendations.first() {
        writeln!(out, "         {tip}")?;
    }
    Ok(())
}

fn sea_line(out: &mut impl Write, sea: &SeaData, fahrenheit: bool) -> fmt::Result {
    // The 0 placeholder for a missing sea temperature is not a reading.
    let mut parts = Vec::new();
    if sea.temperature_reported {
        parts.push(temp(sea.temperature, fahrenheit));
    }
    if let Some(height) = sea.wave_height {
        let mut waves = format!("waves {height:.1} m");
        if let Some(period) = sea.wave_period {
            waves.push_str(&format!(" every {period:.0} s"));
        }
        if let Some(dir) = sea.wave_direction {
            waves.push_str(&format!(" from {}", compass_direction(dir)));
        }
        parts.push(waves);
    }
    writeln!(out, "Sea       {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use weatherdash_core::{
        AirQualityRecord, Condition, Coordinates, PollenRecord,
        astro::{MoonPhase, parse_timezone},
        classify::PollenCategory,
        model::{DailyPoint, DayRange, HourlyPoint, MoonState, TomorrowForecast},
    };

    fn render(s: &WeatherSnapshot, fahrenheit: bool) -> String {
        let mut text = String::new();
        snapshot(&mut text, s, fahrenheit).unwrap();
        text
    }

    fn sample() -> WeatherSnapshot {
        let fetched_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        WeatherSnapshot {
            temperature: 20.0,
            feels_like: 19.0,
            condition: Condition::Sunny,
            description: "Clear conditions throughout the day".into(),
            location: "Centrum, Amsterdam".into(),
            coordinates: Coordinates::new(52.37, 4.89).unwrap(),
            timezone: parse_timezone("Europe/Amsterdam").unwrap(),
            sunrise: "05:24:00".into(),
            sunset: "21:52:00".into(),
            today_forecast: DayRange { high: 23.0, low: 12.0 },
            tomorrow_forecast: TomorrowForecast {
                high: 18.0,
                low: 11.0,
                description: "Rain in the afternoon".into(),
                condition: Condition::Rainy,
            },
            details: Details {
                wind_speed_kmh: 12.0,
                wind_direction_deg: 270.0,
                uv_index: 6.0,
                uv_min: 0.0,
                uv_max: 7.0,
                humidity: 55.0,
                rain_chance: 10.0,
                air_quality: AirQualityRecord::unavailable(),
                pollen: PollenRecord::unavailable(),
            },
            hourly_forecast: vec![HourlyPoint {
                timestamp: fetched_at,
                time_label: "14:00".into(),
                temperature: 21.0,
                condition: Condition::Sunny,
                precip_chance: 5.0,
            }],
            daily_forecast: vec![DailyPoint {
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                high: 22.0,
                low: 13.0,
                condition: Condition::Cloudy,
                precip_chance: 20.0,
                moon: Some(MoonState { phase: MoonPhase::WaningCrescent, illumination: 30 }),
            }],
            sea_data: None,
            fetched_at,
            current_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn renders_main_sections() {
        let text = render(&sample(), false);

        assert!(text.contains("Centrum, Amsterdam"));
        assert!(text.contains("Saturday 1 June 2024"));
        assert!(text.contains("updated 14:00 CEST"));
        assert!(text.contains("20°C Clear conditions throughout the day, feels like 19°C"));
        assert!(text.contains("12 km/h W (arrow 90°), Moderate wind"));
        assert!(text.contains("UV        6 High"));
        assert!(text.contains("Low chance of rain"));
        assert!(text.contains("Air       Unavailable"));
        assert!(text.contains("Pollen    Unavailable"));
        assert!(!text.contains("Sea"));
        assert!(text.contains("Mon 03 Jun"));
        assert!(text.contains("Waning Crescent 30%"));
    }

    #[test]
    fn fahrenheit_is_applied_at_display_time() {
        let text = render(&sample(), true);
        assert!(text.contains("68°F"));
        assert!(!text.contains("°C"));
    }

    #[test]
    fn renders_available_air_pollen_and_sea() {
        let mut s = sample();
        s.details.air_quality = AirQualityRecord {
            aqi: 82,
            description: "Excellent".into(),
            dominant_pollutant: "O3".into(),
            pollutants: Default::default(),
        };
        s.details.pollen.grass = PollenReading {
            value: 40.0,
            category: PollenCategory::High,
            in_season: true,
            recommendations: vec!["Keep windows closed".into()],
        };
        s.sea_data = Some(SeaData {
            temperature: 17.0,
            temperature_reported: true,
            wave_height: Some(0.8),
            wave_direction: Some(225.0),
            wave_period: Some(6.0),
        });

        let text = render(&s, false);
        assert!(text.contains("Air       82 Excellent [#009E3A], mostly O3"));
        assert!(text.contains("Grass  High       (in season)"));
        assert!(text.contains("Keep windows closed"));
        assert!(text.contains("Sea       17°C, waves 0.8 m every 6 s from SW"));
    }

    #[test]
    fn missing_sea_temperature_is_not_shown() {
        let mut s = sample();
        s.sea_data = Some(SeaData {
            temperature: 0.0,
            temperature_reported: false,
            wave_height: Some(1.4),
            wave_direction: None,
            wave_period: None,
        });

        let text = render(&s, false);
        assert!(text.contains("Sea       waves 1.4 m\n"));
        assert!(!text.contains("Sea       0"));
    }
}
