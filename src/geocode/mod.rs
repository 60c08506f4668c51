//! Reverse geocoding: coordinates in, best-effort street address out.
//!
//! Two providers are queried for every lookup:
//!
//! - [`NominatimGeocoder`] — primary, street-level detail (house number, road, neighbourhood)
//! - [`BigDataCloudGeocoder`] — secondary, coarse locality/region/country only
//!
//! [`AddressEnricher`] fans out to both, waits for both to settle, and keeps the
//! primary answer whenever it has one. The summary helpers
//! [`to_display_string`] and [`to_descriptive_string`] turn the result into
//! the short and long captions shown under each photo.

mod bigdatacloud;
mod enricher;
mod nominatim;
mod summary;

pub use bigdatacloud::BigDataCloudGeocoder;
pub use enricher::AddressEnricher;
pub use nominatim::NominatimGeocoder;
pub(crate) use bigdatacloud::DEFAULT_URL as BIGDATACLOUD_URL;
pub(crate) use nominatim::DEFAULT_URL as NOMINATIM_URL;
pub use summary::{LOCATION_UNKNOWN, to_descriptive_string, to_display_string};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A WGS84 coordinate pair in decimal degrees.
///
/// No range validation is applied: out-of-range values are passed to the
/// providers as-is and it is up to them to answer or refuse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Parses `"LAT,LNG"` (whitespace around either number is ignored).
impl FromStr for Coordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lng) = s
            .split_once(',')
            .context("Expected coordinates in the form LAT,LNG")?;
        let lat: f64 = lat
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude: {:?}", lat.trim()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude: {:?}", lng.trim()))?;
        if !lat.is_finite() || !lng.is_finite() {
            anyhow::bail!("Coordinates must be finite numbers");
        }
        Ok(Self { lat, lng })
    }
}

/// Structured address produced by a reverse-geocoding provider.
///
/// Every field is independently optional — providers return whatever they
/// know for a location, and nothing is guaranteed. Serialized with camelCase
/// keys so it can be stored verbatim next to an image record.
///
/// `distance_from_street` is reserved for a distance-to-nearest-street figure
/// and is currently always `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponents {
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub formatted_address: Option<String>,
    pub distance_from_street: Option<f64>,
}

impl AddressComponents {
    /// House number and street name (`"233 S Wacker Dr"`), or the street name alone.
    ///
    /// A house number without a street name yields `None`.
    pub fn street_line(&self) -> Option<String> {
        match (present(&self.street_number), present(&self.street_name)) {
            (Some(number), Some(name)) => Some(format!("{number} {name}")),
            (None, Some(name)) => Some(name.to_string()),
            _ => None,
        }
    }

    /// Fill `formatted_address` from the structured fields.
    ///
    /// Street line, neighborhood, city, state and country, in that order,
    /// skipping missing parts, joined by `", "`. Left as `None` when no part
    /// is present.
    pub(crate) fn with_formatted_address(mut self) -> Self {
        let street = self.street_line();
        let parts: Vec<&str> = [
            street.as_deref(),
            present(&self.neighborhood),
            present(&self.city),
            present(&self.state),
            present(&self.country),
        ]
        .into_iter()
        .flatten()
        .collect();

        self.formatted_address = if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        };
        self
    }
}

/// A reverse-geocoding backend.
///
/// `Ok(None)` means the provider answered but has no address for the
/// coordinate; `Err` covers transport, HTTP status and decoding failures.
/// [`AddressEnricher`] treats both the same way, but keeping them apart lets
/// the enricher log real failures.
#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// The display name of this provider (e.g., "Nominatim").
    fn name(&self) -> &str;
    /// Look up the address at `coordinate`.
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<AddressComponents>>;
}

/// A field's value when it is set and non-empty.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Turn a provider string into a field value, dropping empty strings.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}


#[cfg(test)]
mod tests {
    use super::*;

    // ── Coordinate ───────────────────────────────────────────────────

    #[test]
    fn coordinate_parses_lat_lng() {
        let c: Coordinate = "41.8781,-87.6298".parse().unwrap();
        assert!((c.lat - 41.8781).abs() < 1e-9);
        assert!((c.lng - (-87.6298)).abs() < 1e-9);
    }

    #[test]
    fn coordinate_parses_with_spaces() {
        let c: Coordinate = " -33.8688 , 151.2093 ".parse().unwrap();
        assert!((c.lat - (-33.8688)).abs() < 1e-9);
        assert!((c.lng - 151.2093).abs() < 1e-9);
    }

    #[test]
    fn coordinate_out_of_range_passes_through() {
        let c: Coordinate = "123.0,400.0".parse().unwrap();
        assert_eq!(c, Coordinate::new(123.0, 400.0));
    }

    #[test]
    fn coordinate_rejects_malformed() {
        assert!("41.8781".parse::<Coordinate>().is_err());
        assert!("abc,1.0".parse::<Coordinate>().is_err());
        assert!("1.0,".parse::<Coordinate>().is_err());
        assert!("NaN,1.0".parse::<Coordinate>().is_err());
        assert!("inf,1.0".parse::<Coordinate>().is_err());
    }

    #[test]
    fn coordinate_display() {
        assert_eq!(
            Coordinate::new(41.8781, -87.6298).to_string(),
            "41.878100, -87.629800"
        );
    }

    // ── AddressComponents ────────────────────────────────────────────

    #[test]
    fn street_line_number_and_name() {
        let a = AddressComponents {
            street_number: Some("123".into()),
            street_name: Some("Main St".into()),
            ..Default::default()
        };
        assert_eq!(a.street_line().as_deref(), Some("123 Main St"));
    }

    #[test]
    fn street_line_name_only() {
        let a = AddressComponents {
            street_name: Some("Main St".into()),
            ..Default::default()
        };
        assert_eq!(a.street_line().as_deref(), Some("Main St"));
    }

    #[test]
    fn street_line_number_without_name_is_none() {
        let a = AddressComponents {
            street_number: Some("123".into()),
            ..Default::default()
        };
        assert!(a.street_line().is_none());
    }

    #[test]
    fn formatted_address_full_order() {
        let a = AddressComponents {
            street_number: Some("1".into()),
            street_name: Some("Infinite Loop".into()),
            neighborhood: Some("Loop".into()),
            city: Some("Cupertino".into()),
            state: Some("California".into()),
            country: Some("USA".into()),
            postal_code: Some("95014".into()),
            ..Default::default()
        }
        .with_formatted_address();
        assert_eq!(
            a.formatted_address.as_deref(),
            Some("1 Infinite Loop, Loop, Cupertino, California, USA")
        );
    }

    #[test]
    fn formatted_address_skips_empty_segments() {
        let a = AddressComponents {
            street_name: Some(String::new()),
            city: Some("Chicago".into()),
            country: Some("USA".into()),
            ..Default::default()
        }
        .with_formatted_address();
        assert_eq!(a.formatted_address.as_deref(), Some("Chicago, USA"));
    }

    #[test]
    fn formatted_address_none_when_nothing_present() {
        let a = AddressComponents {
            postal_code: Some("60606".into()),
            ..Default::default()
        }
        .with_formatted_address();
        assert!(a.formatted_address.is_none());
    }

    #[test]
    fn address_serializes_camel_case() {
        let json = serde_json::to_value(mocks::wacker_drive()).unwrap();
        assert_eq!(json["streetNumber"], "233");
        assert_eq!(json["streetName"], "S Wacker Dr");
        assert_eq!(
            json["formattedAddress"],
            "233 S Wacker Dr, Chicago, Illinois, USA"
        );
        assert!(json["distanceFromStreet"].is_null());
    }

    #[test]
    fn address_deserializes_partial_record() {
        let a: AddressComponents = serde_json::from_str(r#"{"city": "Chicago"}"#).unwrap();
        assert_eq!(a.city.as_deref(), Some("Chicago"));
        assert!(a.street_name.is_none());
        assert!(a.distance_from_street.is_none());
    }
}
