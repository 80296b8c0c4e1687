//! Provider selection and report assembly.
//!
//! Every capability walks the same chain, primary then fallback, and takes the
//! first success. A full report runs the four chains concurrently on the
//! calling task and joins them; only current conditions are mandatory.

use futures::future::BoxFuture;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{Credentials, HttpSettings},
    error::{ProviderError, ReportError, ServiceError},
    model::{
        AirQualitySample, Coordinates, CurrentConditions, Enrichment, ForecastDay, Location,
        WeatherReport,
    },
    provider::{Capability, ProviderId, WeatherProvider, provider_from_settings},
};

/// Queries shorter than this never reach a provider.
pub const MIN_QUERY_CHARS: usize = 2;

pub struct WeatherAggregationService {
    primary: Box<dyn WeatherProvider>,
    fallback: Box<dyn WeatherProvider>,
}

impl WeatherAggregationService {
    pub fn new(primary: Box<dyn WeatherProvider>, fallback: Box<dyn WeatherProvider>) -> Self {
        Self { primary, fallback }
    }

    /// Tomorrow.io as primary, OpenWeather as fallback.
    pub fn from_settings(settings: &HttpSettings) -> anyhow::Result<Self> {
        Ok(Self::new(
            provider_from_settings(ProviderId::TomorrowIo, settings)?,
            provider_from_settings(ProviderId::OpenWeather, settings)?,
        ))
    }

    fn chain<'a>(&'a self, credentials: &'a Credentials) -> [(&'a dyn WeatherProvider, &'a str); 2] {
        [
            (self.primary.as_ref(), credentials.primary_key.as_str()),
            (self.fallback.as_ref(), credentials.fallback_key.as_str()),
        ]
    }

    /// Try each provider in order; the first `Ok` wins. Failures are logged and
    /// collected, never retried.
    async fn first_success<'a, T, F>(
        &'a self,
        credentials: &'a Credentials,
        capability: Capability,
        call: F,
    ) -> Result<T, ServiceError>
    where
        F: Fn(&'a dyn WeatherProvider, &'a str) -> BoxFuture<'a, Result<T, ProviderError>>,
    {
        let mut attempts = Vec::new();

        for (provider, key) in self.chain(credentials) {
            match call(provider, key).await {
                Ok(value) => {
                    debug!(%capability, provider = %provider.id(), "served");
                    return Ok(value);
                }
                Err(err @ ProviderError::MissingCredential { .. }) => {
                    debug!(%capability, provider = %provider.id(), "skipped: no API key");
                    attempts.push(err);
                }
                Err(err) => {
                    warn!(%capability, provider = %provider.id(), error = %err, "provider failed");
                    attempts.push(err);
                }
            }
        }

        Err(ServiceError::NoProviderAvailable {
            capability,
            attempts,
        })
    }

    pub async fn current_conditions(
        &self,
        credentials: &Credentials,
        at: Coordinates,
    ) -> Result<CurrentConditions, ServiceError> {
        self.first_success(credentials, Capability::Current, |p, key| p.current(key, at))
            .await
    }

    pub async fn forecast(
        &self,
        credentials: &Credentials,
        at: Coordinates,
        days: u32,
    ) -> Result<Vec<ForecastDay>, ServiceError> {
        if days == 0 {
            return Err(ServiceError::InvalidDays(days));
        }
        self.first_success(credentials, Capability::Forecast, |p, key| {
            p.forecast(key, at, days)
        })
        .await
    }

    pub async fn air_quality(
        &self,
        credentials: &Credentials,
        at: Coordinates,
    ) -> Result<AirQualitySample, ServiceError> {
        self.first_success(credentials, Capability::AirQuality, |p, key| {
            p.air_quality(key, at)
        })
        .await
    }

    pub async fn uv_index(
        &self,
        credentials: &Credentials,
        at: Coordinates,
    ) -> Result<f64, ServiceError> {
        self.first_success(credentials, Capability::UvIndex, |p, key| p.uv_index(key, at))
            .await
    }

    /// Current conditions plus best-effort forecast, air quality and UV.
    ///
    /// The four lookups run concurrently and are all awaited. Optional ones
    /// fall back to empty/zero values; if current conditions cannot be had
    /// the error still carries whatever optional data was collected.
    #[instrument(skip(self, credentials))]
    pub async fn get_full_report(
        &self,
        credentials: &Credentials,
        lat: f64,
        lon: f64,
        days: u32,
    ) -> Result<WeatherReport, ReportError> {
        let at = Coordinates::new(lat, lon).map_err(|e| ReportError {
            cause: e.into(),
            enrichment: Enrichment::default(),
        })?;
        if days == 0 {
            return Err(ReportError {
                cause: ServiceError::InvalidDays(days),
                enrichment: Enrichment::default(),
            });
        }

        let (current, forecast, air_quality, uv_index) = tokio::join!(
            self.current_conditions(credentials, at),
            self.forecast(credentials, at, days),
            self.air_quality(credentials, at),
            self.uv_index(credentials, at),
        );

        let enrichment = Enrichment {
            forecast: forecast.unwrap_or_default(),
            air_quality: air_quality.unwrap_or_default(),
            uv_index: uv_index.unwrap_or_default(),
        };

        match current {
            Ok(mut current) => {
                merge_auxiliary(&mut current, &enrichment);
                info!(
                    location = %current.location_label,
                    forecast_days = enrichment.forecast.len(),
                    "report assembled"
                );
                Ok(WeatherReport::new(current, enrichment))
            }
            Err(cause) => {
                warn!(error = %cause, "current conditions unavailable");
                Err(ReportError { cause, enrichment })
            }
        }
    }

    /// Geocode a free-text query. Never fails: short queries and provider
    /// failures both yield an empty list.
    #[instrument(skip(self, credentials))]
    pub async fn search_locations(&self, credentials: &Credentials, query: &str) -> Vec<Location> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        match self
            .first_success(credentials, Capability::Geocoding, |p, key| {
                p.search_locations(key, query)
            })
            .await
        {
            Ok(locations) => locations,
            Err(err) => {
                warn!(error = %err, "location search failed");
                Vec::new()
            }
        }
    }
}

/// Fill UV and AQI on current conditions from the auxiliary lookups when the
/// current-conditions provider left them empty.
fn merge_auxiliary(current: &mut CurrentConditions, enrichment: &Enrichment) {
    if current.uv_index.is_none() && enrichment.uv_index > 0.0 {
        current.uv_index = Some(enrichment.uv_index);
    }
    if current.air_quality_index.is_none() && enrichment.air_quality.aqi > 0 {
        current.air_quality_index = Some(enrichment.air_quality.aqi);
    }
}
