use std::fmt::Write;

use weather_core::{Location, WeatherReport};

pub fn render_report(report: &WeatherReport) -> String {
    let current = &report.current;
    let mut out = String::new();

    let _ = writeln!(out, "📍 {}", current.location_label);
    let _ = write!(
        out,
        "{}  {}, {}°C",
        current.glyph, current.condition, current.temperature_c
    );
    if let Some(description) = &current.description {
        let _ = write!(out, " ({description})");
    }
    out.push('\n');

    let _ = write!(
        out,
        "Humidity {}%  Wind {} mph",
        current.humidity_pct, current.wind_speed_mph
    );
    if let Some(pressure) = current.pressure_hpa {
        let _ = write!(out, "  Pressure {pressure} hPa");
    }
    if let Some(visibility) = current.visibility_km {
        let _ = write!(out, "  Visibility {visibility} km");
    }
    out.push('\n');

    let mut extras = Vec::new();
    if let Some(uv) = current.uv_index {
        extras.push(format!("UV {uv:.1}"));
    }
    if let Some(aqi) = current.air_quality_index {
        extras.push(format!("AQI {aqi}"));
    }
    if let Some(moon) = &current.moon_phase {
        extras.push(format!("Moon {moon}"));
    }
    if !extras.is_empty() {
        let _ = writeln!(out, "{}", extras.join("  "));
    }

    let air = &report.air_quality;
    if air.aqi > 0 {
        let _ = writeln!(
            out,
            "Air: PM2.5 {:.1}  PM10 {:.1}  O3 {:.1}  NO2 {:.1} µg/m³",
            air.pm25, air.pm10, air.o3, air.no2
        );
    }

    if !report.forecast.is_empty() {
        let _ = writeln!(out, "\nForecast:");
        for day in &report.forecast {
            let _ = writeln!(
                out,
                "  {}  {} {:<12} {:>3}° / {:>3}°  {:.2} mm",
                day.date.format("%a %b %d %Y"),
                day.glyph,
                day.condition,
                day.high_c,
                day.low_c,
                day.precipitation_mm
            );
        }
    }

    out
}

pub fn render_locations(locations: &[Location]) -> String {
    let mut out = String::new();
    for loc in locations {
        let _ = writeln!(
            out,
            "{}, {}  ({:.4}, {:.4})",
            loc.name, loc.country, loc.lat, loc.lon
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use weather_core::{AirQualitySample, CurrentConditions, ForecastDay};

    fn report() -> WeatherReport {
        WeatherReport {
            current: CurrentConditions {
                location_label: "Paris".into(),
                temperature_c: 17,
                condition: "Clear".into(),
                humidity_pct: 48,
                wind_speed_mph: 7,
                glyph: "☀️".into(),
                description: Some("clear sky".into()),
                uv_index: Some(4.5),
                air_quality_index: Some(2),
                pressure_hpa: Some(1014),
                visibility_km: None,
                moon_phase: None,
            },
            forecast: vec![ForecastDay {
                date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
                high_c: 19,
                low_c: 9,
                condition: "Clear".into(),
                glyph: "☀️".into(),
                precipitation_mm: 0.4,
            }],
            air_quality: AirQualitySample::default(),
            uv_index: 4.5,
        }
    }

    #[test]
    fn report_lists_current_and_forecast() {
        let text = render_report(&report());

        assert!(text.contains("📍 Paris"));
        assert!(text.contains("Clear, 17°C (clear sky)"));
        assert!(text.contains("Pressure 1014 hPa"));
        assert!(!text.contains("Visibility"));
        assert!(text.contains("UV 4.5  AQI 2"));
        assert!(text.contains("Mon Oct 19 2026"));
        assert!(text.contains("0.40 mm"));
        assert!(!text.contains("Air:"));
    }

    #[test]
    fn locations_render_one_per_line() {
        let text = render_locations(&[Location {
            name: "Paris".into(),
            lat: 48.8588897,
            lon: 2.320041,
            country: "FR".into(),
        }]);
        assert_eq!(text, "Paris, FR  (48.8589, 2.3200)\n");
    }
}
