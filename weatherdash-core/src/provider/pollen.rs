use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    classify::{PollenCategory, pollen_category},
    model::{Coordinates, PollenReading, PollenRecord},
};

use super::{PollenProvider, read_json};

/// Runs the lookup and substitutes [`PollenRecord::unavailable`] on any failure.
pub async fn fetch_or_unavailable(
    provider: &dyn PollenProvider,
    coords: Coordinates,
) -> PollenRecord {
    match provider.pollen(coords).await {
        Ok(record) => record,
        Err(err) => {
            warn!(
                lat = coords.latitude,
                lon = coords.longitude,
                error = ?err,
                "pollen unavailable"
            );
            PollenRecord::unavailable()
        }
    }
}

/// Google Pollen forecast, today only.
#[derive(Debug, Clone)]
pub struct GooglePollenProvider {
    base_url: String,
    api_key: String,
    http: Client,
}

impl GooglePollenProvider {
    pub fn new(base_url: impl Into<String>, api_key: String, http: Client) -> Self {
        Self { base_url: base_url.into(), api_key, http }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpResponse {
    #[serde(default)]
    daily_info: Vec<GpDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpDay {
    #[serde(default)]
    pollen_type_info: Vec<GpTypeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpTypeInfo {
    code: String,
    index_info: Option<GpIndexInfo>,
    #[serde(default)]
    health_recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GpIndexInfo {
    value: f64,
    category: Option<String>,
}

/// The provider's own label when it names one of our buckets, otherwise the value thresholds.
fn category_for(info: &GpIndexInfo) -> PollenCategory {
    let named = info.category.as_deref().map(|c| c.trim().to_lowercase());
    match named.as_deref() {
        Some("none" | "very low" | "low") => PollenCategory::Low,
        Some("moderate") => PollenCategory::Moderate,
        Some("high") => PollenCategory::High,
        Some("very high") => PollenCategory::VeryHigh,
        _ => pollen_category(info.value),
    }
}

fn reading(types: &[GpTypeInfo], code: &str) -> PollenReading {
    let Some(info) = types.iter().find(|t| t.code.eq_ignore_ascii_case(code)) else {
        return PollenReading::unknown();
    };
    let Some(index) = info.index_info.as_ref() else {
        return PollenReading {
            recommendations: info.health_recommendations.clone(),
            ..PollenReading::unknown()
        };
    };

    PollenReading {
        value: index.value,
        category: category_for(index),
        in_season: index.value > 0.0,
        recommendations: info.health_recommendations.clone(),
    }
}

fn normalize(parsed: GpResponse) -> Result<PollenRecord> {
    let today = parsed
        .daily_info
        .first()
        .ok_or_else(|| anyhow!("Google pollen response contained no daily info"))?;
    let types = &today.pollen_type_info;

    Ok(PollenRecord {
        grass: reading(types, "GRASS"),
        tree: reading(types, "TREE"),
        weed: reading(types, "WEED"),
    })
}

#[async_trait]
impl PollenProvider for GooglePollenProvider {
    async fn pollen(&self, coords: Coordinates) -> Result<PollenRecord> {
        let url = format!("{}/forecast:lookup", self.base_url);
        debug!(%url, "fetching pollen forecast");

        let request = self.http.get(&url).query(&[
            ("key", self.api_key.clone()),
            ("location.latitude", coords.latitude.to_string()),
            ("location.longitude", coords.longitude.to_string()),
            ("days", "1".to_string()),
        ]);

        let parsed: GpResponse = read_json(request, "Google Pollen").await?;
        normalize(parsed)
    }
}

/// Stands in for the pollen lookup when no Google key is configured.
///
/// Every call fails, so the snapshot carries [`PollenRecord::unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPollenProvider;

#[async_trait]
impl PollenProvider for UnconfiguredPollenProvider {
    async fn pollen(&self, _coords: Coordinates) -> Result<PollenRecord> {
        Err(anyhow!("no pollen provider configured"))
    }
}
