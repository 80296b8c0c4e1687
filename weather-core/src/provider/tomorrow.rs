//! Tomorrow.io timelines API, the primary provider.
//!
//! Conditions arrive as numeric `weatherCode`s, wind in m/s and visibility
//! already in kilometres (`units=metric`). No air quality or geocoding on the
//! free tier.

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
    units::{humidity_pct, mps_to_mph, round_whole},
};

use super::{Capability, ProviderId, WeatherProvider, clamp_days, get_json, require_key};

pub const DEFAULT_BASE_URL: &str = "https://api.tomorrow.io/v4";

const CURRENT_FIELDS: &str =
    "temperature,weatherCode,humidity,windSpeed,uvIndex,pressureSeaLevel,visibility,moonPhase";
const HOURLY_FIELDS: &str = "temperature,weatherCode,precipitationIntensity";

#[derive(Debug, Clone)]
pub struct TomorrowIoProvider {
    http: Client,
    base_url: String,
}

impl TomorrowIoProvider {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn timelines(
        &self,
        api_key: &str,
        at: Coordinates,
        timesteps: &str,
        fields: &str,
        end_time: Option<String>,
    ) -> Result<TioResponse, ProviderError> {
        let key = require_key(ProviderId::TomorrowIo, api_key)?;
        let url = format!("{}/timelines", self.base_url.trim_end_matches('/'));
        let query = timeline_query(at, key, timesteps, fields, end_time);

        get_json(&self.http, ProviderId::TomorrowIo, &url, &query).await
    }
}

fn timeline_query(
    at: Coordinates,
    key: &str,
    timesteps: &str,
    fields: &str,
    end_time: Option<String>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("location", format!("{},{}", at.lat(), at.lon())),
        ("fields", fields.to_string()),
        ("timesteps", timesteps.to_string()),
        ("units", "metric".to_string()),
        ("apikey", key.to_string()),
    ];
    if let Some(end) = end_time {
        query.push(("endTime", end));
    }
    query
}

/// Relative end of the hourly timeline, e.g. `nowPlus72h`.
fn forecast_end_time(days: u32) -> String {
    format!("nowPlus{}h", days * 24)
}

#[derive(Debug, Deserialize)]
struct TioResponse {
    data: TioData,
}

#[derive(Debug, Deserialize)]
struct TioData {
    timelines: Vec<TioTimeline>,
}

#[derive(Debug, Deserialize)]
struct TioTimeline {
    intervals: Vec<TioInterval>,
}

#[derive(Debug, Deserialize)]
struct TioInterval {
    #[serde(rename = "startTime")]
    start_time: DateTime<Utc>,
    values: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TioCurrentValues {
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    weather_code: Option<u32>,
    uv_index: Option<f64>,
    pressure_sea_level: Option<f64>,
    visibility: Option<f64>,
    moon_phase: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TioHourlyValues {
    temperature: f64,
    weather_code: Option<u32>,
    #[serde(default)]
    precipitation_intensity: f64,
}

impl TioResponse {
    fn into_intervals(self) -> Result<Vec<TioInterval>, ProviderError> {
        self.data
            .timelines
            .into_iter()
            .next()
            .map(|t| t.intervals)
            .ok_or_else(|| ProviderError::malformed(ProviderId::TomorrowIo, "no timelines"))
    }

    /// Values of the first interval, decoded into `V`.
    fn first_values<V: serde::de::DeserializeOwned>(self) -> Result<V, ProviderError> {
        let first = self.into_intervals()?.into_iter().next().ok_or_else(|| {
            ProviderError::malformed(ProviderId::TomorrowIo, "timeline has no intervals")
        })?;
        decode_values(first.values)
    }
}

fn decode_values<V: serde::de::DeserializeOwned>(
    values: serde_json::Value,
) -> Result<V, ProviderError> {
    serde_json::from_value(values)
        .map_err(|e| ProviderError::malformed(ProviderId::TomorrowIo, e.to_string()))
}

fn moon_phase_name(code: u8) -> Option<&'static str> {
    let name = match code {
        0 => "New Moon",
        1 => "Waxing Crescent",
        2 => "First Quarter",
        3 => "Waxing Gibbous",
        4 => "Full Moon",
        5 => "Waning Gibbous",
        6 => "Third Quarter",
        7 => "Waning Crescent",
        _ => return None,
    };
    Some(name)
}

fn normalize_current(at: Coordinates, values: TioCurrentValues) -> CurrentConditions {
    let condition = values
        .weather_code
        .map(Condition::from_code)
        .unwrap_or(Condition::Unknown);

    CurrentConditions {
        location_label: at.label(),
        temperature_c: round_whole(values.temperature),
        condition: condition.to_string(),
        humidity_pct: humidity_pct(values.humidity),
        wind_speed_mph: mps_to_mph(values.wind_speed),
        glyph: condition.glyph(true).to_string(),
        description: Some(format!("{condition} weather today")),
        uv_index: values.uv_index,
        air_quality_index: None,
        pressure_hpa: values.pressure_sea_level.map(round_whole),
        visibility_km: values.visibility.map(round_whole),
        moon_phase: values
            .moon_phase
            .and_then(moon_phase_name)
            .map(str::to_string),
    }
}

fn hourly_samples(
    intervals: Vec<TioInterval>,
) -> Result<Vec<Sample>, ProviderError> {
    intervals
        .into_iter()
        .map(|interval| -> Result<Sample, ProviderError> {
            let values: TioHourlyValues = decode_values(interval.values)?;
            Ok(Sample {
                timestamp: interval.start_time,
                temperature_c: values.temperature,
                condition: values
                    .weather_code
                    .map(Condition::from_code)
                    .unwrap_or(Condition::Unknown),
                // mm/h over a one hour step
                precipitation_mm: values.precipitation_intensity,
            })
        })
        .collect()
}

#[async_trait]
impl WeatherProvider for TomorrowIoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::TomorrowIo
    }

    #[instrument(skip(self, api_key), fields(provider = "tomorrow.io"))]
    async fn current(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<CurrentConditions, ProviderError> {
        let values: TioCurrentValues = self
            .timelines(api_key, at, "current", CURRENT_FIELDS, None)
            .await?
            .first_values()?;

        Ok(normalize_current(at, values))
    }

    #[instrument(skip(self, api_key), fields(provider = "tomorrow.io"))]
    async fn forecast(
        &self,
        api_key: &str,
        at: Coordinates,
        days: u32,
    ) -> Result<Vec<ForecastDay>, ProviderError> {
        let days = clamp_days(days);

        let intervals = self
            .timelines(api_key, at, "1h", HOURLY_FIELDS, Some(forecast_end_time(days)))
            .await?
            .into_intervals()?;

        let samples = hourly_samples(intervals)?;
        debug!(samples = samples.len(), "bucketing hourly samples");

        Ok(aggregate_daily(&samples, days as usize, &Local))
    }

    async fn air_quality(
        &self,
        api_key: &str,
        _at: Coordinates,
    ) -> Result<AirQualitySample, ProviderError> {
        require_key(ProviderId::TomorrowIo, api_key)?;
        Err(ProviderError::Unsupported {
            provider: ProviderId::TomorrowIo,
            capability: Capability::AirQuality,
        })
    }

    #[instrument(skip(self, api_key), fields(provider = "tomorrow.io"))]
    async fn uv_index(&self, api_key: &str, at: Coordinates) -> Result<f64, ProviderError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct UvValues {
            uv_index: f64,
        }

        let values: UvValues = self
            .timelines(api_key, at, "current", "uvIndex", None)
            .await?
            .first_values()?;

        Ok(values.uv_index)
    }

    async fn search_locations(
        &self,
        api_key: &str,
        _query: &str,
    ) -> Result<Vec<Location>, ProviderError> {
        require_key(ProviderId::TomorrowIo, api_key)?;
        Err(ProviderError::Unsupported {
            provider: ProviderId::TomorrowIo,
            capability: Capability::Geocoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::parse_body;
    use chrono::NaiveDate;

    const CURRENT_BODY: &str = r#"{
        "data": {
            "timelines": [{
                "timestep": "current",
                "startTime": "2026-10-19T09:00:00Z",
                "endTime": "2026-10-19T09:00:00Z",
                "intervals": [{
                    "startTime": "2026-10-19T09:00:00Z",
                    "values": {
                        "temperature": 14.6,
                        "weatherCode": 1101,
                        "humidity": 71.5,
                        "windSpeed": 4.2,
                        "uvIndex": 3,
                        "pressureSeaLevel": 1016.44,
                        "visibility": 16,
                        "moonPhase": 2
                    }
                }]
            }]
        }
    }"#;

    fn paris() -> Coordinates {
        Coordinates::new(48.8566, 2.3522).unwrap()
    }

    #[test]
    fn normalizes_current_timeline() {
        let values: TioCurrentValues = parse_body::<TioResponse>(ProviderId::TomorrowIo, CURRENT_BODY)
            .unwrap()
            .first_values()
            .unwrap();

        let current = normalize_current(paris(), values);

        assert_eq!(current.location_label, "48.86, 2.35");
        assert_eq!(current.temperature_c, 15);
        assert_eq!(current.condition, "Cloudy");
        assert_eq!(current.glyph, "☁️");
        assert_eq!(current.humidity_pct, 72);
        // 4.2 * 2.237 = 9.39
        assert_eq!(current.wind_speed_mph, 9);
        assert_eq!(current.uv_index, Some(3.0));
        assert_eq!(current.pressure_hpa, Some(1016));
        assert_eq!(current.visibility_km, Some(16));
        assert_eq!(current.moon_phase.as_deref(), Some("First Quarter"));
        assert_eq!(current.description.as_deref(), Some("Cloudy weather today"));
        assert_eq!(current.air_quality_index, None);
    }

    #[test]
    fn unknown_weather_code_and_missing_extras_degrade() {
        let values: TioCurrentValues = serde_json::from_str(
            r#"{"temperature": -0.5, "humidity": 90, "windSpeed": 0.0, "weatherCode": 42}"#,
        )
        .unwrap();

        let current = normalize_current(paris(), values);
        assert_eq!(current.condition, "Unknown");
        assert_eq!(current.temperature_c, -1);
        assert_eq!(current.pressure_hpa, None);
        assert_eq!(current.moon_phase, None);
    }

    #[test]
    fn missing_mandatory_value_is_malformed() {
        let body = r#"{"data":{"timelines":[{"intervals":[{"startTime":"2026-10-19T09:00:00Z","values":{"humidity":50}}]}]}}"#;
        let err = parse_body::<TioResponse>(ProviderId::TomorrowIo, body)
            .unwrap()
            .first_values::<TioCurrentValues>()
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedPayload { .. }));
    }

    #[test]
    fn empty_timelines_are_malformed() {
        let response = parse_body::<TioResponse>(ProviderId::TomorrowIo, r#"{"data":{"timelines":[]}}"#)
            .unwrap();
        assert!(matches!(
            response.into_intervals(),
            Err(ProviderError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn hourly_intervals_become_daily_buckets() {
        let body = r#"{"data":{"timelines":[{"intervals":[
            {"startTime":"2026-10-19T10:00:00Z","values":{"temperature":12.0,"weatherCode":4001,"precipitationIntensity":0.6}},
            {"startTime":"2026-10-19T11:00:00Z","values":{"temperature":13.4,"weatherCode":1000,"precipitationIntensity":0.2}},
            {"startTime":"2026-10-20T10:00:00Z","values":{"temperature":9.0,"weatherCode":5000}}
        ]}]}}"#;

        let intervals = parse_body::<TioResponse>(ProviderId::TomorrowIo, body)
            .unwrap()
            .into_intervals()
            .unwrap();
        let samples = hourly_samples(intervals).unwrap();
        let days = aggregate_daily(&samples, 5, &Utc);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(days[0].condition, "Rain");
        assert_eq!(days[0].high_c, 13);
        assert_eq!(days[0].low_c, 12);
        assert_eq!(days[0].precipitation_mm, 0.8);
        assert_eq!(days[1].condition, "Snow");
        assert_eq!(days[1].precipitation_mm, 0.0);
    }

    #[tokio::test]
    async fn blank_key_fails_before_any_request() {
        // Unroutable base URL: reaching the network would be a Transport error.
        let provider = TomorrowIoProvider::new(Client::new(), "http://127.0.0.1:9");
        let err = provider.current("", paris()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));

        let err = provider.forecast(" ", paris(), 3).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn air_quality_and_geocoding_are_unsupported() {
        let provider = TomorrowIoProvider::new(Client::new(), DEFAULT_BASE_URL);

        let err = provider.air_quality("key", paris()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Unsupported {
                capability: Capability::AirQuality,
                ..
            }
        ));

        let err = provider.search_locations("key", "Paris").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Unsupported {
                capability: Capability::Geocoding,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let provider = TomorrowIoProvider::new(Client::new(), "http://127.0.0.1:9");
        let err = provider.uv_index("SUPERSECRETKEY", paris()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert!(!err.to_string().contains("SUPERSECRETKEY"), "{err}");
    }

    #[test]
    fn timeline_query_carries_location_units_and_key() {
        let query = timeline_query(paris(), "tio", "current", "uvIndex", None);
        assert_eq!(
            query,
            vec![
                ("location", "48.8566,2.3522".to_string()),
                ("fields", "uvIndex".to_string()),
                ("timesteps", "current".to_string()),
                ("units", "metric".to_string()),
                ("apikey", "tio".to_string()),
            ]
        );
    }

    #[test]
    fn hourly_timeline_ends_after_requested_days() {
        assert_eq!(forecast_end_time(clamp_days(3)), "nowPlus72h");
        assert_eq!(forecast_end_time(clamp_days(0)), "nowPlus24h");
        assert_eq!(forecast_end_time(clamp_days(9)), "nowPlus120h");

        let query = timeline_query(paris(), "tio", "1h", HOURLY_FIELDS, Some(forecast_end_time(2)));
        assert_eq!(query.last(), Some(&("endTime", "nowPlus48h".to_string())));
    }
}
