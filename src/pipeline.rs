use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::exif;
use crate::geocode::{
    self, AddressComponents, AddressEnricher, BigDataCloudGeocoder, Coordinate, NominatimGeocoder,
};
use crate::imaging;

/// Extensions that are decoded and prepared for upload.
const PREPARABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff"];

/// Extensions whose GPS is read, but that are never prepared.
const LOCATE_ONLY_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Everything known about one image after it went through the pipeline.
///
/// This is the shape stored next to the image: the address is kept verbatim
/// as returned by enrichment, alongside both captions.
///
/// # Example
///
/// ```rust,no_run
/// # use chicago_oracle::pipeline::{build_enricher, process_image};
/// # use chicago_oracle::config::Config;
/// # async fn example() {
/// # let config = Config::default();
/// # let enricher = build_enricher(&config);
/// let record = process_image("photo.jpg".as_ref(), &enricher, &config, None).await;
///
/// println!("{}", record.display);
/// if let Some(ref address) = record.address {
///     println!("Formatted: {:?}", address.formatted_address);
/// }
/// # }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub path: PathBuf,
    /// The cropped/resized JPEG, if one was written.
    pub prepared_path: Option<PathBuf>,
    pub coordinate: Option<Coordinate>,
    pub address: Option<AddressComponents>,
    /// Short caption, e.g. `"233 S Wacker Dr"`.
    pub display: String,
    /// Long caption, e.g. `"233 S Wacker Dr, Chicago, Illinois"`.
    pub descriptive: String,
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files with supported image
/// extensions are included.
///
/// # Example
///
/// ```rust,no_run
/// use chicago_oracle::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    has_extension(path, PREPARABLE_EXTENSIONS) || has_extension(path, LOCATE_ONLY_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}

/// Build the primary/secondary enricher from configuration.
pub fn build_enricher(config: &Config) -> AddressEnricher {
    AddressEnricher::new(
        Box::new(NominatimGeocoder::new(
            config.geocoding.primary_url.clone(),
            config.geocoding.user_agent.clone(),
        )),
        Box::new(BigDataCloudGeocoder::new(
            config.geocoding.secondary_url.clone(),
        )),
    )
}

/// Run a single image through the pipeline.
///
/// 1. **Locate** — use `coordinate` if given, otherwise the EXIF GPS position
/// 2. **Prepare** — crop/resize into `upload.output_dir` (skipped on dry run,
///    when unset, or for HEIC/HEIF sources)
/// 3. **Enrich** — reverse-geocode the coordinate, if there is one
///
/// Enrichment can never fail an image. An image without a location simply
/// gets no address and the "Location unknown" captions. Only a failed
/// preparation sets [`ImageRecord::error`].
pub async fn process_image(
    path: &Path,
    enricher: &AddressEnricher,
    config: &Config,
    coordinate: Option<Coordinate>,
) -> ImageRecord {
    let coordinate = coordinate.or_else(|| read_coordinate(path));

    let mut record = ImageRecord {
        path: path.to_path_buf(),
        prepared_path: None,
        coordinate,
        address: None,
        display: String::new(),
        descriptive: String::new(),
        error: None,
    };

    if let Some(ref out_dir) = config.upload.output_dir {
        if config.output.dry_run {
            log::debug!("  Dry run: not preparing {}", path.display());
        } else if !has_extension(path, PREPARABLE_EXTENSIONS) {
            log::info!("  Preparation not supported for {}", path.display());
        } else {
            match imaging::prepare_upload(
                path,
                Path::new(out_dir),
                config.upload.aspect_ratio,
                config.upload.max_width,
                config.upload.jpeg_quality,
            ) {
                Ok(dest) => record.prepared_path = Some(dest),
                Err(e) => {
                    log::warn!("  Failed to prepare {}: {e:#}", path.display());
                    record.error = Some(format!("Failed to prepare upload: {e:#}"));
                }
            }
        }
    }

    match coordinate {
        Some(c) => {
            log::info!("  Location: {c}");
            record.address = enricher.enrich(c.lat, c.lng).await;
        }
        None => log::info!("  No GPS location"),
    }

    record.display = geocode::to_display_string(record.address.as_ref(), None);
    record.descriptive = geocode::to_descriptive_string(record.address.as_ref(), None);

    record
}

/// EXIF GPS position of an image; read failures are logged and ignored.
fn read_coordinate(path: &Path) -> Option<Coordinate> {
    match exif::read_exif(path) {
        Ok(data) => data.coordinate(),
        Err(e) => {
            log::warn!("Failed to read EXIF from {}: {e}", path.display());
            None
        }
    }
}
