//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Credential storage and on-disk configuration
//! - Two weather providers (Tomorrow.io primary, OpenWeather fallback) behind
//!   one trait, normalized into a shared schema
//! - Condition codes, unit conversion and daily forecast bucketing
//! - The aggregation service that walks the provider chain per capability
//!
//! It is used by `weather-cli`, but any front end can drive
//! [`WeatherAggregationService`] directly.

pub mod condition;
pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod service;
pub mod units;

pub use condition::Condition;
pub use config::{Config, ConfigFile, CredentialSink, CredentialStore, Credentials, HttpSettings};
pub use error::{ProviderError, ReportError, ServiceError};
pub use model::{
    AirQualitySample, Coordinates, CurrentConditions, Enrichment, ForecastDay, Location,
    WeatherReport,
};
pub use provider::{Capability, ProviderId, WeatherProvider};
pub use service::WeatherAggregationService;
