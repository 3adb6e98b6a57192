use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::provider::{AirQualitySource, ProviderId};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Base URLs of every collaborator. Overridable for proxies and self-hosted mirrors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geocoding: String,
    pub timeline: String,
    pub google_air_quality: String,
    pub open_meteo_air_quality: String,
    pub pollen: String,
    pub marine: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: "https://nominatim.openstreetmap.org".to_string(),
            timeline: "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline"
                .to_string(),
            google_air_quality: "https://airquality.googleapis.com/v1".to_string(),
            open_meteo_air_quality: "https://air-quality-api.open-meteo.com/v1".to_string(),
            pollen: "https://pollen.googleapis.com/v1".to_string(),
            marine: "https://marine-api.open-meteo.com/v1".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Example TOML:
    /// [providers.visualcrossing]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    pub air_quality_source: AirQualitySource,

    pub use_24_hour_clock: bool,

    pub fahrenheit: bool,

    pub request_timeout_secs: u64,

    /// Sent with every request; the OpenStreetMap geocoder rejects anonymous clients.
    pub user_agent: String,

    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            air_quality_source: AirQualitySource::default(),
            use_24_hour_clock: true,
            fahrenheit: false,
            request_timeout_secs: 10,
            user_agent: concat!("weatherdash/", env!("CARGO_PKG_VERSION")).to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    /// API key for a provider the current setup cannot run without.
    pub fn require_api_key(&self, provider_id: ProviderId) -> Result<&str> {
        self.provider_api_key(provider_id).ok_or_else(|| {
            anyhow!(
                "No API key configured for provider '{provider_id}'.\n\
                 Hint: run `weatherdash configure {provider_id}` and enter your API key."
            )
        })
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weatherdash", "weatherdash")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_no_file() {
        let cfg = Config::default();
        assert!(cfg.use_24_hour_clock);
        assert!(!cfg.fahrenheit);
        assert_eq!(cfg.air_quality_source, AirQualitySource::OpenMeteo);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_key_error_has_hint() {
        let cfg = Config::default();
        let err = cfg.require_api_key(ProviderId::VisualCrossing).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured for provider 'visualcrossing'"));
        assert!(msg.contains("weatherdash configure visualcrossing"));
    }

    #[test]
    fn upsert_replaces_existing_key() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::Google, "OLD".into());
        cfg.upsert_provider_api_key(ProviderId::Google, "NEW".into());

        assert_eq!(cfg.provider_api_key(ProviderId::Google), Some("NEW"));
        assert!(cfg.is_provider_configured(ProviderId::Google));
        assert!(!cfg.is_provider_configured(ProviderId::VisualCrossing));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            air_quality_source = "google"
            use_24_hour_clock = false

            [providers.google]
            api_key = "G"

            [endpoints]
            marine = "http://localhost:9000/v1"
            "#,
        )
        .expect("config must parse");

        assert_eq!(cfg.air_quality_source, AirQualitySource::Google);
        assert!(!cfg.use_24_hour_clock);
        assert_eq!(cfg.provider_api_key(ProviderId::Google), Some("G"));
        assert_eq!(cfg.endpoints.marine, "http://localhost:9000/v1");
        assert_eq!(cfg.endpoints.pollen, Endpoints::default().pollen);
        assert_eq!(cfg.request_timeout_secs, 10);
    }

    #[test]
    fn save_and_load_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::VisualCrossing, "VC".into());
        cfg.fahrenheit = true;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider_api_key(ProviderId::VisualCrossing), Some("VC"));
        assert!(loaded.fahrenheit);
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.providers.is_empty());
    }
}
