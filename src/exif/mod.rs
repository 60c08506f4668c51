//! Embedded GPS metadata reading.
//!
//! Photos taken on a phone usually carry the capture location in their EXIF
//! GPS block. [`read_exif`] extracts it as decimal degrees so the pipeline can
//! enrich images that arrive without device coordinates.

mod reader;

pub use reader::{ExifData, read_exif};
