use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::Coordinates;

use super::{Geocoder, read_json};

pub const UNKNOWN_LOCATION: &str = "Unknown location";

const MIN_QUERY_CHARS: usize = 3;
const MAX_SEARCH_RESULTS: usize = 5;

/// Address parts returned by reverse geocoding, finest first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Place {
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub country_code: Option<String>,
}

impl Place {
    /// `"Suburb, City"` when both are known, otherwise `"City, CC"`.
    pub fn display_name(&self) -> Option<String> {
        let fine = first_present([&self.suburb, &self.city_district]);
        let locality = first_present([&self.city, &self.town, &self.village, &self.municipality]);
        let country = self
            .country_code
            .as_deref()
            .filter(|cc| !cc.trim().is_empty())
            .map(str::to_uppercase);

        match (fine, locality) {
            (Some(fine), Some(locality)) if fine != locality => Some(format!("{fine}, {locality}")),
            (_, Some(name)) | (Some(name), None) => Some(match country {
                Some(cc) => format!("{name}, {cc}"),
                None => name.to_string(),
            }),
            (None, None) => None,
        }
    }
}

fn first_present<const N: usize>(candidates: [&Option<String>; N]) -> Option<&str> {
    candidates
        .into_iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// A forward-geocoding hit the user can pick from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub coordinates: Coordinates,
}

/// Reverse-geocodes `coords` into a display string. Never fails: any error or an empty
/// answer yields [`UNKNOWN_LOCATION`].
pub async fn locate(geocoder: &dyn Geocoder, coords: Coordinates) -> String {
    match geocoder.reverse(coords).await {
        Ok(place) => place.display_name().unwrap_or_else(|| {
            debug!(
                lat = coords.latitude,
                lon = coords.longitude,
                "reverse geocoding found no place name"
            );
            UNKNOWN_LOCATION.to_string()
        }),
        Err(err) => {
            warn!(
                lat = coords.latitude,
                lon = coords.longitude,
                error = ?err,
                "reverse geocoding failed"
            );
            UNKNOWN_LOCATION.to_string()
        }
    }
}

/// OpenStreetMap Nominatim.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct NmReverse {
    error: Option<String>,
    address: Option<Place>,
}

#[derive(Debug, Deserialize)]
struct NmAddress {
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmSearchHit {
    lat: String,
    lon: String,
    name: Option<String>,
    display_name: String,
    address: Option<NmAddress>,
}

fn reverse_to_place(parsed: NmReverse) -> Result<Place> {
    if let Some(error) = parsed.error {
        return Err(anyhow!("Nominatim reverse lookup failed: {error}"));
    }
    parsed
        .address
        .ok_or_else(|| anyhow!("Nominatim reverse response contained no address"))
}

fn search_to_candidates(hits: Vec<NmSearchHit>) -> Vec<PlaceCandidate> {
    hits.into_iter()
        .filter_map(|hit| {
            let latitude = hit.lat.parse().ok()?;
            let longitude = hit.lon.parse().ok()?;
            let coordinates = Coordinates::new(latitude, longitude).ok()?;

            let base = hit
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(hit.display_name);
            let country = hit.address.and_then(|a| a.country_code);
            let name = match country {
                Some(cc) => format!("{base}, {}", cc.to_uppercase()),
                None => base,
            };

            Some(PlaceCandidate { name, coordinates })
        })
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, coords: Coordinates) -> Result<Place> {
        let url = format!("{}/reverse", self.base_url);
        debug!(%url, lat = coords.latitude, lon = coords.longitude, "reverse geocoding");

        let request = self.http.get(&url).query(&[
            ("format", "jsonv2".to_string()),
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("zoom", "14".to_string()),
            ("addressdetails", "1".to_string()),
        ]);

        let parsed: NmReverse = read_json(request, "Nominatim (reverse)").await?;
        reverse_to_place(parsed)
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let limit = MAX_SEARCH_RESULTS.to_string();
        let request = self.http.get(&url).query(&[
            ("q", query),
            ("format", "jsonv2"),
            ("addressdetails", "1"),
            ("limit", limit.as_str()),
        ]);

        let hits: Vec<NmSearchHit> = read_json(request, "Nominatim (search)").await?;
        Ok(search_to_candidates(hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn place(json: serde_json::Value) -> Place {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn suburb_and_city_are_preferred() {
        let p = place(json!({
            "suburb": "De Pijp",
            "city": "Amsterdam",
            "country_code": "nl"
        }));
        assert_eq!(p.display_name().as_deref(), Some("De Pijp, Amsterdam"));
    }

    #[test]
    fn district_stands_in_for_suburb() {
        let p = place(json!({ "city_district": "Mitte", "city": "Berlin", "country_code": "de" }));
        assert_eq!(p.display_name().as_deref(), Some("Mitte, Berlin"));
    }

    #[test]
    fn locality_falls_back_with_country_code() {
        let p = place(json!({ "village": "Giethoorn", "country_code": "nl" }));
        assert_eq!(p.display_name().as_deref(), Some("Giethoorn, NL"));

        let p = place(json!({ "municipality": "Texel" }));
        assert_eq!(p.display_name().as_deref(), Some("Texel"));
    }

    #[test]
    fn empty_address_has_no_name() {
        assert_eq!(Place::default().display_name(), None);
        let p = place(json!({ "city": "  ", "country_code": "nl" }));
        assert_eq!(p.display_name(), None);
    }

    #[test]
    fn nominatim_error_payload_is_an_error() {
        let parsed: NmReverse =
            serde_json::from_value(json!({ "error": "Unable to geocode" })).unwrap();
        assert!(reverse_to_place(parsed).is_err());

        let parsed: NmReverse = serde_json::from_value(json!({
            "display_name": "Somewhere",
            "address": { "town": "Zandvoort", "country_code": "nl", "postcode": "2042" }
        }))
        .unwrap();
        assert_eq!(reverse_to_place(parsed).unwrap().town.as_deref(), Some("Zandvoort"));
    }

    #[test]
    fn search_hits_become_candidates() {
        let hits: Vec<NmSearchHit> = serde_json::from_value(json!([
            { "lat": "52.3730796", "lon": "4.8924534", "name": "Amsterdam",
              "display_name": "Amsterdam, Noord-Holland, Nederland",
              "address": { "country_code": "nl" } },
            { "lat": "not-a-number", "lon": "4.0", "name": "Broken", "display_name": "Broken" },
            { "lat": "40.7127281", "lon": "-74.0060152", "name": "",
              "display_name": "New York, United States" }
        ]))
        .unwrap();

        let candidates = search_to_candidates(hits);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Amsterdam, NL");
        assert!((candidates[0].coordinates.latitude - 52.3730796).abs() < 1e-9);
        assert_eq!(candidates[1].name, "New York, United States");
    }

    #[derive(Debug)]
    struct FixedGeocoder(Mutex<Option<Result<Place>>>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn reverse(&self, _coords: Coordinates) -> Result<Place> {
            self.0.lock().unwrap().take().expect("reverse called once")
        }

        async fn search(&self, _query: &str) -> Result<Vec<PlaceCandidate>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn locate_falls_back_to_unknown_location() {
        let coords = Coordinates::new(0.0, 0.0).unwrap();

        let failing = FixedGeocoder(Mutex::new(Some(Err(anyhow!("timeout")))));
        assert_eq!(locate(&failing, coords).await, UNKNOWN_LOCATION);

        let nameless = FixedGeocoder(Mutex::new(Some(Ok(Place::default()))));
        assert_eq!(locate(&nameless, coords).await, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn short_queries_skip_the_request() {
        let geocoder = NominatimGeocoder::new("http://127.0.0.1:9", Client::new());
        assert!(geocoder.search("ab").await.unwrap().is_empty());
    }
}
