//! Short and long captions derived from an [`AddressComponents`].

use super::{AddressComponents, present};

/// Caption used when neither the address nor the caller's fallback has anything.
pub const LOCATION_UNKNOWN: &str = "Location unknown";

/// Short caption for an image, e.g. `"233 S Wacker Dr"`.
///
/// First match wins: street number + street name, street name, neighborhood,
/// city, the provider's formatted address, `fallback`, then
/// [`LOCATION_UNKNOWN`]. Empty strings count as missing.
pub fn to_display_string(components: Option<&AddressComponents>, fallback: Option<&str>) -> String {
    components
        .and_then(|c| {
            c.street_line()
                .or_else(|| present(&c.neighborhood).map(str::to_string))
                .or_else(|| present(&c.city).map(str::to_string))
                .or_else(|| present(&c.formatted_address).map(str::to_string))
        })
        .unwrap_or_else(|| last_resort(fallback))
}

/// Long caption for an image, e.g. `"233 S Wacker Dr, Loop, Chicago, Illinois"`.
///
/// Street line, neighborhood, city and state are appended in that order,
/// skipping any value identical to one already added (exact comparison).
/// With nothing to append, falls back to the formatted address, then
/// `fallback`, then [`LOCATION_UNKNOWN`].
pub fn to_descriptive_string(
    components: Option<&AddressComponents>,
    fallback: Option<&str>,
) -> String {
    let Some(c) = components else {
        return last_resort(fallback);
    };

    let mut segments: Vec<String> = Vec::new();
    if let Some(street) = c.street_line() {
        segments.push(street);
    }
    for part in [&c.neighborhood, &c.city, &c.state] {
        if let Some(part) = present(part) {
            if !segments.iter().any(|s| s == part) {
                segments.push(part.to_string());
            }
        }
    }

    if !segments.is_empty() {
        return segments.join(", ");
    }

    present(&c.formatted_address)
        .map(str::to_string)
        .unwrap_or_else(|| last_resort(fallback))
}

fn last_resort(fallback: Option<&str>) -> String {
    fallback
        .filter(|s| !s.is_empty())
        .unwrap_or(LOCATION_UNKNOWN)
        .to_string()
}
