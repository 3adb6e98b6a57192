//! External collaborators and the HTTP plumbing they share.
//!
//! Each collaborator is a trait object so the aggregator can be driven by any backend.
//! The `reqwest` implementations keep their wire structs private and expose only
//! normalized records.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{convert::TryFrom, fmt::Debug};

use crate::{
    config::Config,
    model::{AirQualityRecord, Coordinates, PollenRecord, SeaData},
};

pub mod air_quality;
pub mod geocode;
pub mod marine;
pub mod pollen;
pub mod timeline;

pub use geocode::{Place, PlaceCandidate};
pub use timeline::{CurrentConditions, Timeline, TimelineDay, TimelineHour};

/// Providers that need an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    VisualCrossing,
    Google,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::VisualCrossing => "visualcrossing",
            ProviderId::Google => "google",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::VisualCrossing, ProviderId::Google]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "visualcrossing" => Ok(ProviderId::VisualCrossing),
            "google" => Ok(ProviderId::Google),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: visualcrossing, google."
            )),
        }
    }
}

/// Which backend answers air-quality lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AirQualitySource {
    Google,
    #[default]
    OpenMeteo,
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn reverse(&self, coords: Coordinates) -> Result<Place>;

    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn timeline(&self, coords: Coordinates) -> Result<Timeline>;
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    /// Reading already converted to the canonical good-high scale.
    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityRecord>;
}

#[async_trait]
pub trait PollenProvider: Send + Sync + Debug {
    async fn pollen(&self, coords: Coordinates) -> Result<PollenRecord>;
}

#[async_trait]
pub trait MarineProvider: Send + Sync + Debug {
    /// `Ok(None)` when the location has no marine data for the hour of `now`.
    async fn sea(&self, coords: Coordinates, now: DateTime<Utc>) -> Result<Option<SeaData>>;
}

/// One HTTP client shared by every collaborator.
pub fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")
}

/// Sends `request`, checks the status and parses the body as JSON.
/// `what` names the provider call in error messages.
pub(crate) async fn read_json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("Google").unwrap(), ProviderId::Google);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn air_quality_source_uses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            source: AirQualitySource,
        }
        let w: Wrapper = toml::from_str(r#"source = "open-meteo""#).unwrap();
        assert_eq!(w.source, AirQualitySource::OpenMeteo);
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let body = "é".repeat(300);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(http_client(&Config::default()).is_ok());
    }
}
