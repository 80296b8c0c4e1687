//! OpenWeatherMap, the fallback provider. Also the only one with geocoding.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    condition::Condition,
    error::ProviderError,
    forecast::{Sample, aggregate_daily},
    model::{AirQualitySample, Coordinates, CurrentConditions, ForecastDay, Location},
    units::{humidity_pct, meters_to_km, mps_to_mph, round_whole},
};

use super::{ProviderId, WeatherProvider, clamp_days, get_json, require_key};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Three-hour samples per day in the `/forecast` feed.
const SAMPLES_PER_DAY: u32 = 8;
const GEOCODING_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

}

type Query = Vec<(&'static str, String)>;

fn coordinate_query(at: Coordinates, key: &str) -> Query {
    vec![
        ("lat", at.lat().to_string()),
        ("lon", at.lon().to_string()),
        ("appid", key.to_string()),
    ]
}

fn current_query(at: Coordinates, key: &str) -> Query {
    let mut query = coordinate_query(at, key);
    query.push(("units", "metric".to_string()));
    query
}

/// `days` must already be clamped to the supported range.
fn forecast_query(at: Coordinates, key: &str, days: u32) -> Query {
    let mut query = current_query(at, key);
    query.push(("cnt", (days * SAMPLES_PER_DAY).to_string()));
    query
}

fn geocoding_query(query: &str, key: &str) -> Query {
    vec![
        ("q", query.to_string()),
        ("limit", GEOCODING_LIMIT.to_string()),
        ("appid", key.to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
    #[serde(default)]
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    visibility: Option<f64>,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwVolume {
    #[serde(rename = "3h", default)]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    rain: Option<OwVolume>,
    #[serde(default)]
    snow: Option<OwVolume>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAirMain {
    aqi: u32,
}

#[derive(Debug, Deserialize)]
struct OwAirComponents {
    #[serde(default)]
    pm2_5: f64,
    #[serde(default)]
    pm10: f64,
    #[serde(default)]
    o3: f64,
    #[serde(default)]
    no2: f64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAirMain,
    components: OwAirComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwUvResponse {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, ProviderError> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| {
        ProviderError::malformed(ProviderId::OpenWeather, format!("timestamp {ts} out of range"))
    })
}

fn is_daytime(dt: i64, sys: &OwSys) -> bool {
    match (sys.sunrise, sys.sunset) {
        (Some(rise), Some(set)) => (rise..set).contains(&dt),
        _ => true,
    }
}

fn normalize_current(
    at: Coordinates,
    parsed: OwCurrentResponse,
) -> Result<CurrentConditions, ProviderError> {
    let weather = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed(ProviderId::OpenWeather, "empty `weather` list"))?;

    let condition = Condition::from_label(&weather.main);
    let daytime = is_daytime(parsed.dt, &parsed.sys);

    let location_label = if parsed.name.trim().is_empty() {
        at.label()
    } else {
        parsed.name
    };

    Ok(CurrentConditions {
        location_label,
        temperature_c: round_whole(parsed.main.temp),
        condition: condition.to_string(),
        humidity_pct: humidity_pct(parsed.main.humidity),
        wind_speed_mph: mps_to_mph(parsed.wind.speed),
        glyph: condition.glyph(daytime).to_string(),
        description: weather.description,
        uv_index: None,
        air_quality_index: None,
        pressure_hpa: parsed.main.pressure.map(round_whole),
        visibility_km: parsed.visibility.map(meters_to_km),
        moon_phase: None,
    })
}

fn forecast_samples(parsed: OwForecastResponse) -> Result<Vec<Sample>, ProviderError> {
    parsed
        .list
        .into_iter()
        .map(|entry| -> Result<Sample, ProviderError> {
            let label = entry.weather.first().map(|w| w.main.as_str()).unwrap_or("");
            let precipitation_mm = entry
                .rain
                .and_then(|v| v.three_hours)
                .or_else(|| entry.snow.and_then(|v| v.three_hours))
                .unwrap_or(0.0);

            Ok(Sample {
                timestamp: unix_to_utc(entry.dt)?,
                temperature_c: entry.main.temp,
                condition: Condition::from_label(label),
                precipitation_mm,
            })
        })
        .collect()
}

fn normalize_air(parsed: OwAirResponse) -> Result<AirQualitySample, ProviderError> {
    let entry = parsed
        .list
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed(ProviderId::OpenWeather, "empty `list`"))?;

    Ok(AirQualitySample {
        aqi: entry.main.aqi,
        pm25: entry.components.pm2_5,
        pm10: entry.components.pm10,
        o3: entry.components.o3,
        no2: entry.components.no2,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    #[instrument(skip(self, api_key), fields(provider = "openweather"))]
    async fn current(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<CurrentConditions, ProviderError> {
        let key = require_key(ProviderId::OpenWeather, api_key)?;

        let parsed: OwCurrentResponse = get_json(
            &self.http,
            ProviderId::OpenWeather,
            &self.url("/data/2.5/weather"),
            &current_query(at, key),
        )
        .await?;

        normalize_current(at, parsed)
    }

    #[instrument(skip(self, api_key), fields(provider = "openweather"))]
    async fn forecast(
        &self,
        api_key: &str,
        at: Coordinates,
        days: u32,
    ) -> Result<Vec<ForecastDay>, ProviderError> {
        let key = require_key(ProviderId::OpenWeather, api_key)?;
        let days = clamp_days(days);

        let parsed: OwForecastResponse = get_json(
            &self.http,
            ProviderId::OpenWeather,
            &self.url("/data/2.5/forecast"),
            &forecast_query(at, key, days),
        )
        .await?;

        let samples = forecast_samples(parsed)?;
        debug!(samples = samples.len(), "bucketing 3-hour samples");

        Ok(aggregate_daily(&samples, days as usize, &Local))
    }

    #[instrument(skip(self, api_key), fields(provider = "openweather"))]
    async fn air_quality(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<AirQualitySample, ProviderError> {
        let key = require_key(ProviderId::OpenWeather, api_key)?;

        let parsed: OwAirResponse = get_json(
            &self.http,
            ProviderId::OpenWeather,
            &self.url("/data/2.5/air_pollution"),
            &coordinate_query(at, key),
        )
        .await?;

        normalize_air(parsed)
    }

    #[instrument(skip(self, api_key), fields(provider = "openweather"))]
    async fn uv_index(&self, api_key: &str, at: Coordinates) -> Result<f64, ProviderError> {
        let key = require_key(ProviderId::OpenWeather, api_key)?;

        let parsed: OwUvResponse = get_json(
            &self.http,
            ProviderId::OpenWeather,
            &self.url("/data/2.5/uvi"),
            &coordinate_query(at, key),
        )
        .await?;

        Ok(parsed.value)
    }

    #[instrument(skip(self, api_key), fields(provider = "openweather"))]
    async fn search_locations(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<Vec<Location>, ProviderError> {
        let key = require_key(ProviderId::OpenWeather, api_key)?;

        let parsed: Vec<OwGeoEntry> = get_json(
            &self.http,
            ProviderId::OpenWeather,
            &self.url("/geo/1.0/direct"),
            &geocoding_query(query, key),
        )
        .await?;

        Ok(parsed
            .into_iter()
            .map(|g| Location {
                name: g.name,
                lat: g.lat,
                lon: g.lon,
                country: g.country,
            })
            .collect())
    }
}
