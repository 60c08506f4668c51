//! OpenStreetMap Nominatim reverse geocoding (primary provider).
//!
//! See: https://nominatim.org/release-docs/latest/api/Reverse/
//!
//! Nominatim's `address` object uses locale-dependent keys: a street can come
//! back as `road`, `pedestrian` or `footway`, a city as `city`, `town` or
//! `village`. The first non-empty key in each group is used. The usage policy
//! requires an identifying `User-Agent` on every request.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{AddressComponents, Coordinate, ReverseGeocoder};

pub(crate) const DEFAULT_URL: &str = "https://nominatim.openstreetmap.org/reverse";

const STREET_NUMBER_KEYS: &[&str] = &["house_number"];
const STREET_NAME_KEYS: &[&str] = &["road", "pedestrian", "footway"];
const NEIGHBORHOOD_KEYS: &[&str] = &["neighbourhood", "suburb"];
const CITY_KEYS: &[&str] = &["city", "town", "village"];
const STATE_KEYS: &[&str] = &["state"];
const COUNTRY_KEYS: &[&str] = &["country"];
const POSTAL_CODE_KEYS: &[&str] = &["postcode"];

/// Response body of `/reverse?format=json`. Only the parts we read.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    /// Locale-dependent address parts; absent when nothing is found.
    address: Option<Map<String, Value>>,
    /// Set instead of `address` for e.g. coordinates in the open sea.
    error: Option<String>,
}

pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, user_agent: String) -> Self {
        Self {
            base_url,
            user_agent,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        "Nominatim"
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<AddressComponents>> {
        let resp = self
            .client
            .get(&self.base_url)
            .header("User-Agent", &self.user_agent)
            .query(&[("format", "json"), ("addressdetails", "1")])
            .query(&[("lat", coordinate.lat), ("lon", coordinate.lng)])
            .send()
            .await
            .context("Nominatim request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read Nominatim response")?;

        if !status.is_success() {
            anyhow::bail!("Nominatim API error ({}): {}", status, truncate(&text));
        }

        parse_response(&text)
    }
}

/// Parse a Nominatim reverse response into address components.
///
/// A missing or empty `address` object, or an `error` payload, is "no result".
/// Any non-empty `address` object counts as an answer, even when none of the
/// keys we map are in it.
fn parse_response(text: &str) -> Result<Option<AddressComponents>> {
    let response: ReverseResponse =
        serde_json::from_str(text).context("Failed to parse Nominatim response JSON")?;

    if let Some(ref err) = response.error {
        log::debug!("Nominatim: {err}");
        return Ok(None);
    }

    let Some(address) = response.address.filter(|a| !a.is_empty()) else {
        return Ok(None);
    };

    let components = AddressComponents {
        street_number: pick(&address, STREET_NUMBER_KEYS),
        street_name: pick(&address, STREET_NAME_KEYS),
        neighborhood: pick(&address, NEIGHBORHOOD_KEYS),
        city: pick(&address, CITY_KEYS),
        state: pick(&address, STATE_KEYS),
        country: pick(&address, COUNTRY_KEYS),
        postal_code: pick(&address, POSTAL_CODE_KEYS),
        formatted_address: None,
        distance_from_street: None,
    };

    Ok(Some(components.with_formatted_address()))
}

/// First non-empty string value among `keys`.
fn pick(address: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| super::non_empty(address.get(*key).and_then(Value::as_str)))
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
