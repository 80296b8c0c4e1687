use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::provider::{openweather, tomorrow};

/// API keys for the primary and fallback weather providers plus the
/// assistant service. A blank string means "not configured".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub primary_key: String,
    #[serde(default)]
    pub fallback_key: String,
    #[serde(default)]
    pub assistant_key: String,
}

impl Credentials {
    pub fn new(
        primary: impl Into<String>,
        fallback: impl Into<String>,
        assistant: impl Into<String>,
    ) -> Self {
        Self {
            primary_key: primary.into(),
            fallback_key: fallback.into(),
            assistant_key: assistant.into(),
        }
    }

    pub fn has_primary(&self) -> bool {
        !self.primary_key.trim().is_empty()
    }

    pub fn has_fallback(&self) -> bool {
        !self.fallback_key.trim().is_empty()
    }
}

// Keys must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(key: &str) -> &'static str {
            if key.trim().is_empty() { "<unset>" } else { "<redacted>" }
        }
        f.debug_struct("Credentials")
            .field("primary_key", &mask(&self.primary_key))
            .field("fallback_key", &mask(&self.fallback_key))
            .field("assistant_key", &mask(&self.assistant_key))
            .finish()
    }
}

/// Receives the credential triple whenever it is replaced.
pub trait CredentialSink: Send + Sync {
    fn persist(&self, credentials: &Credentials) -> Result<()>;
}

/// Holds the current credentials and hands every replacement to its sink.
#[derive(Default)]
pub struct CredentialStore {
    credentials: Credentials,
    sink: Option<Box<dyn CredentialSink>>,
}

impl CredentialStore {
    /// In-memory store; `set` does not persist anywhere.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            sink: None,
        }
    }

    pub fn with_sink(credentials: Credentials, sink: Box<dyn CredentialSink>) -> Self {
        Self {
            credentials,
            sink: Some(sink),
        }
    }

    pub fn get(&self) -> &Credentials {
        &self.credentials
    }

    /// Replace all three keys. Formats are not validated.
    pub fn set(
        &mut self,
        primary: impl Into<String>,
        fallback: impl Into<String>,
        assistant: impl Into<String>,
    ) -> Result<()> {
        self.credentials = Credentials::new(primary, fallback, assistant);

        if let Some(sink) = &self.sink {
            sink.persist(&self.credentials)
                .context("Failed to persist credentials")?;
        }

        Ok(())
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credentials", &self.credentials)
            .field("persistent", &self.sink.is_some())
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_primary_base_url() -> String {
    tomorrow::DEFAULT_BASE_URL.to_string()
}

fn default_fallback_base_url() -> String {
    openweather::DEFAULT_BASE_URL.to_string()
}

/// Outbound HTTP settings shared by both providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_primary_base_url")]
    pub primary_base_url: String,
    #[serde(default = "default_fallback_base_url")]
    pub fallback_base_url: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            primary_base_url: default_primary_base_url(),
            fallback_base_url: default_fallback_base_url(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [credentials]
/// primary_key = "..."
/// fallback_key = "..."
///
/// [http]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub http: HttpSettings,
}

impl Config {
    /// Load config from the platform location, or an empty default on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file yet, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Persists credentials into a config file, leaving its other sections intact.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn platform_default() -> Result<Self> {
        Ok(Self::new(Config::config_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        Config::load_from(&self.path)
    }
}

impl CredentialSink for ConfigFile {
    fn persist(&self, credentials: &Credentials) -> Result<()> {
        let mut cfg = Config::load_from(&self.path)?;
        cfg.credentials = credentials.clone();
        cfg.save_to(&self.path)
    }
}
