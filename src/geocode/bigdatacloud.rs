//! BigDataCloud client-side reverse geocoding (secondary provider).
//!
//! Free, keyless, and coarse: it knows the locality, the principal
//! subdivision (state/region) and the country, never the street.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{AddressComponents, Coordinate, ReverseGeocoder, non_empty};

pub(crate) const DEFAULT_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";

/// Response body of `reverse-geocode-client`. Only the parts we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseResponse {
    locality: Option<String>,
    principal_subdivision: Option<String>,
    country_name: Option<String>,
}

pub struct BigDataCloudGeocoder {
    base_url: String,
    client: Client,
}

impl BigDataCloudGeocoder {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for BigDataCloudGeocoder {
    fn name(&self) -> &str {
        "BigDataCloud"
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<AddressComponents>> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("latitude", coordinate.lat), ("longitude", coordinate.lng)])
            .query(&[("localityLanguage", "en")])
            .send()
            .await
            .context("BigDataCloud request failed")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("Failed to read BigDataCloud response")?;

        if !status.is_success() {
            let snippet: String = text.chars().take(200).collect();
            anyhow::bail!("BigDataCloud API error ({}): {}", status, snippet);
        }

        parse_response(&text)
    }
}

/// Map a BigDataCloud response onto address components.
///
/// Only city, state and country can be filled. A response with none of the
/// three is "no result".
fn parse_response(text: &str) -> Result<Option<AddressComponents>> {
    let response: ReverseResponse =
        serde_json::from_str(text).context("Failed to parse BigDataCloud response JSON")?;

    let components = AddressComponents {
        city: non_empty(response.locality.as_deref()),
        state: non_empty(response.principal_subdivision.as_deref()),
        country: non_empty(response.country_name.as_deref()),
        ..Default::default()
    };

    if components.city.is_none() && components.state.is_none() && components.country.is_none() {
        return Ok(None);
    }

    Ok(Some(components.with_formatted_address()))
}
