use thiserror::Error;

use crate::{
    model::{CoordinateError, Enrichment},
    provider::{Capability, ProviderId},
};

/// A single provider failing a single capability.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for {provider}")]
    MissingCredential { provider: ProviderId },

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} rejected the request with status {status}: {body}")]
    UpstreamRejected {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("unexpected payload from {provider}: {reason}")]
    MalformedPayload { provider: ProviderId, reason: String },

    #[error("{provider} does not offer {capability}")]
    Unsupported {
        provider: ProviderId,
        capability: Capability,
    },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderError::MissingCredential { provider }
            | ProviderError::Transport { provider, .. }
            | ProviderError::UpstreamRejected { provider, .. }
            | ProviderError::MalformedPayload { provider, .. }
            | ProviderError::Unsupported { provider, .. } => *provider,
        }
    }

    pub(crate) fn malformed(provider: ProviderId, reason: impl Into<String>) -> Self {
        ProviderError::MalformedPayload {
            provider,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Every provider in the chain failed; `attempts` is in chain order.
    #[error("no provider could supply {capability} ({} attempted)", .attempts.len())]
    NoProviderAvailable {
        capability: Capability,
        attempts: Vec<ProviderError>,
    },

    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinateError),

    #[error("forecast length must be at least one day, got {0}")]
    InvalidDays(u32),
}

/// Current conditions could not be produced. The optional capabilities that
/// did succeed are still handed back.
#[derive(Debug, Error)]
#[error("current conditions unavailable: {cause}")]
pub struct ReportError {
    #[source]
    pub cause: ServiceError,
    pub enrichment: Enrichment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_chain_reports_attempt_count() {
        let err = ServiceError::NoProviderAvailable {
            capability: Capability::Current,
            attempts: vec![
                ProviderError::MissingCredential {
                    provider: ProviderId::TomorrowIo,
                },
                ProviderError::malformed(ProviderId::OpenWeather, "missing field `main`"),
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("current conditions"));
        assert!(msg.contains("2 attempted"));
    }

    #[test]
    fn provider_is_recoverable_from_every_kind() {
        let err = ProviderError::UpstreamRejected {
            provider: ProviderId::OpenWeather,
            status: 401,
            body: "Invalid API key".into(),
        };
        assert_eq!(err.provider(), ProviderId::OpenWeather);
        assert!(err.to_string().contains("401"));
    }
}
