use anyhow::{Context, Result};
use nom_exif::*;
use std::path::Path;

use crate::geocode::Coordinate;

/// GPS data extracted from an image.
#[derive(Debug, Clone, Default)]
pub struct ExifData {
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
}

impl ExifData {
    /// The capture location, when both latitude and longitude are present
    /// and finite.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.gps_latitude, self.gps_longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Coordinate::new(lat, lng))
            }
            _ => None,
        }
    }
}

/// Read the GPS position embedded in an image file.
///
/// Images without EXIF, or with EXIF but no GPS block, yield
/// `ExifData::default()`.
pub fn read_exif(path: &Path) -> Result<ExifData> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(ExifData::default());
        }
    };

    let mut data = ExifData::default();

    // nom-exif's built-in GPS parser
    if let Some(gps) = iter.parse_gps_info().ok().flatten() {
        data.gps_latitude = latlng_to_decimal(&gps.latitude, gps.latitude_ref);
        data.gps_longitude = latlng_to_decimal(&gps.longitude, gps.longitude_ref);
        match data.coordinate() {
            Some(c) => log::debug!("GPS in {}: {c}", path.display()),
            None => log::debug!("Unusable GPS block in {}", path.display()),
        }
    }

    Ok(data)
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> Option<f64> {
    rationals_to_decimal(
        [
            (latlng.0.0 as f64, latlng.0.1 as f64),
            (latlng.1.0 as f64, latlng.1.1 as f64),
            (latlng.2.0 as f64, latlng.2.1 as f64),
        ],
        reference,
    )
}

/// `[degrees, minutes, seconds]` as numerator/denominator pairs.
///
/// Cameras write `0/0` for components they don't know. Unknown minutes or
/// seconds count as zero; unknown degrees make the whole value unknown.
fn rationals_to_decimal(dms: [(f64, f64); 3], reference: char) -> Option<f64> {
    let [degrees, minutes, seconds] = dms;
    if degrees.1 == 0.0 {
        return None;
    }
    let ratio = |(num, den): (f64, f64)| if den == 0.0 { 0.0 } else { num / den };
    let value = dms_to_decimal(ratio(degrees), ratio(minutes), ratio(seconds), reference);
    value.is_finite().then_some(value)
}

/// Degrees, minutes and seconds to signed decimal degrees (`S`/`W` negative).
fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, reference: char) -> f64 {
    let coord = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference == 'S' || reference == 'W' {
        -coord
    } else {
        coord
    }
}
