//! # chicago-oracle
//!
//! Geotagged photo pipeline — crop uploads to the feed's aspect ratio and
//! caption them with a best-effort street address obtained by reverse
//! geocoding (OpenStreetMap Nominatim, with BigDataCloud as fallback).
//!
//! ## Quick Start
//!
//! Enrich a coordinate directly:
//!
//! ```rust,no_run
//! use chicago_oracle::config::Config;
//! use chicago_oracle::geocode::{to_descriptive_string, to_display_string};
//! use chicago_oracle::pipeline::build_enricher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let enricher = build_enricher(&config);
//!
//!     // Never fails: `None` when neither provider knows the place
//!     let address = enricher.enrich(41.8781, -87.6298).await;
//!
//!     println!("{}", to_display_string(address.as_ref(), None));      // "233 S Wacker Dr"
//!     println!("{}", to_descriptive_string(address.as_ref(), None));  // "233 S Wacker Dr, Loop, Chicago, Illinois"
//!     Ok(())
//! }
//! ```
//!
//! ## Processing Images
//!
//! The pipeline reads the GPS position from EXIF, writes a cropped/resized
//! JPEG (when `upload.output_dir` is configured) and enriches the location:
//!
//! ```rust,no_run
//! use chicago_oracle::config::Config;
//! use chicago_oracle::pipeline::{build_enricher, collect_images, process_image};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let enricher = build_enricher(&config);
//!
//!     for path in collect_images(&[PathBuf::from("./photos")]) {
//!         let record = process_image(&path, &enricher, &config, None).await;
//!         println!("{}: {}", path.display(), record.display);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`geocode`] — Coordinates, address model, providers, enricher, and caption helpers
//! - [`imaging`] — Center-crop to a fixed aspect ratio and downscale
//! - [`exif`] — Embedded GPS reading
//! - [`config`] — Configuration types and loading/saving
//! - [`pipeline`] — Image collection and per-image processing

pub mod config;
pub mod exif;
pub mod geocode;
pub mod imaging;
pub mod pipeline;
