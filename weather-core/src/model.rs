use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Human label used when a provider has no place name, e.g. `"48.86, 2.35"`.
    pub fn label(&self) -> String {
        format!("{:.2}, {:.2}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_label: String,
    pub temperature_c: i32,
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_speed_mph: u32,
    pub glyph: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_hpa: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_km: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moon_phase: Option<String>,
}

/// One calendar day of forecast, temperatures rounded once at output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub high_c: i32,
    pub low_c: i32,
    pub condition: String,
    pub glyph: String,
    pub precipitation_mm: f64,
}

/// Pollutant concentrations in µg/m³; every field is zero when unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    pub aqi: u32,
    pub pm25: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
}

/// Geocoding candidate returned by location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
}

/// Everything the caller renders besides current conditions.
///
/// Each field falls back to its empty/zero default when no provider could
/// supply it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub forecast: Vec<ForecastDay>,
    pub air_quality: AirQualitySample,
    pub uv_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    pub air_quality: AirQualitySample,
    pub uv_index: f64,
}

impl WeatherReport {
    pub fn new(current: CurrentConditions, enrichment: Enrichment) -> Self {
        Self {
            current,
            forecast: enrichment.forecast,
            air_quality: enrichment.air_quality,
            uv_index: enrichment.uv_index,
        }
    }
}
