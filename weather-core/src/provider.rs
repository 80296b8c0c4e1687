use std::{fmt, time::Duration};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::HttpSettings,
    error::ProviderError,
    model::{AirQualitySample, Coordinates, CurrentConditions, ForecastDay, Location},
    provider::{openweather::OpenWeatherProvider, tomorrow::TomorrowIoProvider},
};

pub mod openweather;
pub mod tomorrow;

/// Longest forecast either provider serves on its free tier.
pub const MAX_FORECAST_DAYS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    TomorrowIo,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::TomorrowIo => "tomorrow.io",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::TomorrowIo, ProviderId::OpenWeather]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently fetched piece of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Current,
    Forecast,
    AirQuality,
    UvIndex,
    Geocoding,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Current => "current conditions",
            Capability::Forecast => "forecast",
            Capability::AirQuality => "air quality",
            Capability::UvIndex => "UV index",
            Capability::Geocoding => "location search",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weather data source. Every call takes the API key explicitly; a blank
/// key fails with [`ProviderError::MissingCredential`] before any request.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn current(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<CurrentConditions, ProviderError>;

    async fn forecast(
        &self,
        api_key: &str,
        at: Coordinates,
        days: u32,
    ) -> Result<Vec<ForecastDay>, ProviderError>;

    async fn air_quality(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<AirQualitySample, ProviderError>;

    async fn uv_index(&self, api_key: &str, at: Coordinates) -> Result<f64, ProviderError>;

    async fn search_locations(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<Vec<Location>, ProviderError>;
}

/// Construct a provider with its HTTP client and endpoint from settings.
pub fn provider_from_settings(
    id: ProviderId,
    settings: &HttpSettings,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let http = Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .user_agent(concat!("weather-core/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::TomorrowIo => Box::new(TomorrowIoProvider::new(
            http,
            settings.primary_base_url.clone(),
        )),
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(
            http,
            settings.fallback_base_url.clone(),
        )),
    };

    Ok(boxed)
}

pub(crate) fn require_key(provider: ProviderId, api_key: &str) -> Result<&str, ProviderError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ProviderError::MissingCredential { provider });
    }
    Ok(key)
}

/// Issue one GET and decode the JSON body, classifying every failure.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    provider: ProviderId,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, ProviderError> {
    debug!(%provider, url, "sending request");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| transport(provider, source))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| transport(provider, source))?;

    if !status.is_success() {
        return Err(ProviderError::UpstreamRejected {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    parse_body(provider, &body)
}

/// Keys travel as query parameters, so the URL is dropped from the error.
fn transport(provider: ProviderId, source: reqwest::Error) -> ProviderError {
    ProviderError::Transport {
        provider,
        source: source.without_url(),
    }
}

/// Forecast length actually requested from a provider.
pub(crate) fn clamp_days(days: u32) -> u32 {
    days.clamp(1, MAX_FORECAST_DAYS)
}

pub(crate) fn parse_body<T: DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::malformed(provider, e.to_string()))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
