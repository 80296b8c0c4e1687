use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{
    ConfigFile, CredentialStore, ProviderError, ServiceError, WeatherAggregationService,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enter API keys for the primary (Tomorrow.io) and fallback (OpenWeather) providers.
    Configure,

    /// Show current conditions, forecast, air quality and UV for a coordinate.
    Show {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Number of forecast days (1-5).
        #[arg(long, default_value_t = 5)]
        days: u32,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Look up coordinates for a place name.
    Search {
        query: String,

        /// Print the candidates as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let file = ConfigFile::platform_default()?;
        let config = file.load()?;

        match self.command {
            Command::Configure => {
                let mut store = CredentialStore::with_sink(config.credentials, Box::new(file.clone()));
                let current = store.get().clone();

                let primary = prompt_key("Tomorrow.io API key", &current.primary_key)?;
                let fallback = prompt_key("OpenWeather API key", &current.fallback_key)?;
                let assistant = prompt_key("Assistant API key", &current.assistant_key)?;

                store.set(primary, fallback, assistant)?;
                println!("Saved credentials to {}", file.path().display());

                let saved = store.get();
                println!(
                    "  Tomorrow.io: {}\n  OpenWeather: {}",
                    configured(saved.has_primary()),
                    configured(saved.has_fallback()),
                );
                if !saved.has_primary() && !saved.has_fallback() {
                    println!("No provider key set; `weather show` will fail until one is added.");
                }
            }
            Command::Show {
                lat,
                lon,
                days,
                json,
            } => {
                let service = WeatherAggregationService::from_settings(&config.http)?;

                let report = match service
                    .get_full_report(&config.credentials, lat, lon, days)
                    .await
                {
                    Ok(report) => report,
                    Err(err) => {
                        if let ServiceError::NoProviderAvailable { attempts, .. } = &err.cause {
                            for attempt in attempts {
                                eprintln!("  - {attempt}");
                            }
                        }
                        match missing_key_hint(&err.cause) {
                            Some(hint) => bail!("{err}\n{hint}"),
                            None => bail!("{err}"),
                        }
                    }
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", output::render_report(&report));
                }
            }
            Command::Search { query, json } => {
                let service = WeatherAggregationService::from_settings(&config.http)?;
                let locations = service.search_locations(&config.credentials, &query).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&locations)?);
                } else if locations.is_empty() {
                    println!("No locations found for '{query}'.");
                } else {
                    print!("{}", output::render_locations(&locations));
                }
            }
        }

        Ok(())
    }
}

/// Point at `weather configure` when some provider was skipped for lack of a key.
fn missing_key_hint(cause: &ServiceError) -> Option<String> {
    let ServiceError::NoProviderAvailable { attempts, .. } = cause else {
        return None;
    };

    let unconfigured: Vec<String> = attempts
        .iter()
        .filter(|a| matches!(a, ProviderError::MissingCredential { .. }))
        .map(|a| a.provider().to_string())
        .collect();

    if unconfigured.is_empty() {
        return None;
    }
    Some(format!(
        "Hint: run `weather configure` to add a key for {}.",
        unconfigured.join(" or ")
    ))
}

fn configured(present: bool) -> &'static str {
    if present { "configured" } else { "not set" }
}

/// Ask for a key without echoing it. Empty input keeps the existing value.
fn prompt_key(label: &str, existing: &str) -> Result<String> {
    let help = if existing.trim().is_empty() {
        "Leave empty to skip this provider"
    } else {
        "Leave empty to keep the current key"
    };

    let entered = Password::new(label)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message(help)
        .prompt()
        .with_context(|| format!("Failed to read {label}"))?;

    if entered.trim().is_empty() {
        Ok(existing.to_string())
    } else {
        Ok(entered.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::{Capability, ProviderId};

    #[test]
    fn hint_names_providers_without_keys() {
        let cause = ServiceError::NoProviderAvailable {
            capability: Capability::Current,
            attempts: vec![
                ProviderError::MissingCredential {
                    provider: ProviderId::TomorrowIo,
                },
                ProviderError::UpstreamRejected {
                    provider: ProviderId::OpenWeather,
                    status: 401,
                    body: "invalid key".to_string(),
                },
            ],
        };

        assert_eq!(
            missing_key_hint(&cause).as_deref(),
            Some("Hint: run `weather configure` to add a key for tomorrow.io.")
        );
    }

    #[test]
    fn no_hint_when_every_provider_had_a_key() {
        let cause = ServiceError::NoProviderAvailable {
            capability: Capability::Current,
            attempts: vec![ProviderError::Unsupported {
                provider: ProviderId::TomorrowIo,
                capability: Capability::Current,
            }],
        };
        assert_eq!(missing_key_hint(&cause), None);
        assert_eq!(missing_key_hint(&ServiceError::InvalidDays(0)), None);
    }
}
