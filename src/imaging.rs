//! Upload preparation: crop to the feed aspect ratio, then downscale.
//!
//! The feed shows every photo in the same frame, so uploads are cropped to
//! the largest centered rectangle with the configured [`AspectRatio`] and
//! shrunk to a maximum width before being re-encoded as JPEG.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target frame shape, e.g. `4:3`. Stored in config as the string `"4:3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Aspect ratio components must be non-zero (got {width}:{height})");
        }
        Ok(Self { width, height })
    }

    /// Height matching `width` at this ratio, at least 1.
    fn height_for(&self, width: u32) -> u32 {
        let h = width as u64 * self.height as u64 / self.width as u64;
        h.max(1) as u32
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self { width: 4, height: 3 }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(':')
            .with_context(|| format!("Expected aspect ratio as W:H, got {s:?}"))?;
        let w: u32 = w.trim().parse().context("Invalid aspect ratio width")?;
        let h: u32 = h.trim().parse().context("Invalid aspect ratio height")?;
        Self::new(w, h)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.to_string()
    }
}

/// A crop window in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The largest rectangle with `ratio` that fits in the source, centered.
pub fn crop_rect(src_width: u32, src_height: u32, ratio: AspectRatio) -> CropRect {
    if src_width == 0 || src_height == 0 {
        return CropRect { x: 0, y: 0, width: 0, height: 0 };
    }

    let (w, h) = (src_width as u64, src_height as u64);
    let (rw, rh) = (ratio.width as u64, ratio.height as u64);

    if w * rh > h * rw {
        // Source is wider than the target: keep full height, trim the sides.
        let width = (h * rw / rh).clamp(1, w) as u32;
        CropRect {
            x: (src_width - width) / 2,
            y: 0,
            width,
            height: src_height,
        }
    } else {
        // Source is taller (or exact): keep full width, trim top and bottom.
        let height = (w * rh / rw).clamp(1, h) as u32;
        CropRect {
            x: 0,
            y: (src_height - height) / 2,
            width: src_width,
            height,
        }
    }
}

/// Crop `image` to `ratio` and shrink it to at most `max_width` pixels wide.
///
/// Images narrower than `max_width` are never upscaled. A `max_width` of 0
/// disables downscaling.
pub fn crop_to_aspect(image: &DynamicImage, ratio: AspectRatio, max_width: u32) -> DynamicImage {
    let rect = crop_rect(image.width(), image.height(), ratio);
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);

    if max_width == 0 || rect.width <= max_width {
        return cropped;
    }

    let height = ratio.height_for(max_width);
    log::debug!(
        "Resizing {}x{} -> {}x{}",
        rect.width,
        rect.height,
        max_width,
        height
    );
    cropped.resize_exact(max_width, height, FilterType::Lanczos3)
}

/// Decode `src`, crop and resize it, and write `out_dir/<stem>.jpg`.
///
/// Creates `out_dir` if needed. Existing files are never overwritten: if the
/// name is taken, `<stem>-1.jpg`, `<stem>-2.jpg`, ... are tried in turn.
/// Returns the path written.
pub fn prepare_upload(
    src: &Path,
    out_dir: &Path,
    ratio: AspectRatio,
    max_width: u32,
    jpeg_quality: u8,
) -> Result<PathBuf> {
    let image = image::open(src)
        .with_context(|| format!("Failed to decode image {}", src.display()))?;
    let prepared = crop_to_aspect(&image, ratio, max_width);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let stem = src
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let (dest, file) = create_unique(out_dir, stem)?;
    let mut writer = BufWriter::new(file);

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(prepared.to_rgb8());
    let encoder = JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
    rgb.write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;
    writer.flush().context("Failed to write prepared image")?;

    log::debug!(
        "Prepared {} -> {} ({}x{})",
        src.display(),
        dest.display(),
        rgb.width(),
        rgb.height()
    );

    Ok(dest)
}

/// Create the first free `<stem>.jpg` / `<stem>-<n>.jpg` in `dir`.
fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
    for n in 0u32.. {
        let name = match n {
            0 => format!("{stem}.jpg"),
            n => format!("{stem}-{n}.jpg"),
        };
        let dest = dir.join(name);
        match File::create_new(&dest) {
            Ok(file) => return Ok((dest, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", dest.display()));
            }
        }
    }
    anyhow::bail!("No free file name for {stem}.jpg in {}", dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn ratio(w: u32, h: u32) -> AspectRatio {
        AspectRatio::new(w, h).unwrap()
    }

    // ── AspectRatio ──────────────────────────────────────────────────

    #[test]
    fn aspect_ratio_parse_and_display() {
        let r: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(r, ratio(16, 9));
        assert_eq!(r.to_string(), "16:9");
        assert_eq!(" 4 : 5 ".parse::<AspectRatio>().unwrap(), ratio(4, 5));
    }

    #[test]
    fn aspect_ratio_rejects_bad_input() {
        assert!("0:3".parse::<AspectRatio>().is_err());
        assert!("4:0".parse::<AspectRatio>().is_err());
        assert!("4x3".parse::<AspectRatio>().is_err());
        assert!("a:b".parse::<AspectRatio>().is_err());
        assert!("-4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn aspect_ratio_serde_as_string() {
        let json = serde_json::to_string(&ratio(3, 2)).unwrap();
        assert_eq!(json, r#""3:2""#);
        let back: AspectRatio = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ratio(3, 2));
        assert!(serde_json::from_str::<AspectRatio>(r#""3:0""#).is_err());
    }

    #[test]
    fn aspect_ratio_default_is_four_three() {
        assert_eq!(AspectRatio::default(), ratio(4, 3));
    }

    // ── crop_rect ────────────────────────────────────────────────────

    #[test]
    fn crop_rect_wide_source_trims_sides() {
        let r = crop_rect(400, 200, ratio(4, 3));
        assert_eq!(r, CropRect { x: 67, y: 0, width: 266, height: 200 });
    }

    #[test]
    fn crop_rect_tall_source_trims_top_and_bottom() {
        let r = crop_rect(300, 1000, ratio(4, 3));
        assert_eq!(r, CropRect { x: 0, y: 387, width: 300, height: 225 });
    }

    #[test]
    fn crop_rect_exact_ratio_is_identity() {
        let r = crop_rect(800, 600, ratio(4, 3));
        assert_eq!(r, CropRect { x: 0, y: 0, width: 800, height: 600 });
    }

    #[test]
    fn crop_rect_square() {
        let r = crop_rect(1920, 1080, ratio(1, 1));
        assert_eq!(r, CropRect { x: 420, y: 0, width: 1080, height: 1080 });
    }

    #[test]
    fn crop_rect_stays_in_bounds_for_tiny_sources() {
        for (w, h) in [(1, 1), (1, 100), (100, 1), (3, 2)] {
            let r = crop_rect(w, h, ratio(16, 9));
            assert!(r.width >= 1 && r.height >= 1);
            assert!(r.x + r.width <= w, "{w}x{h}: {r:?}");
            assert!(r.y + r.height <= h, "{w}x{h}: {r:?}");
        }
    }

    #[test]
    fn crop_rect_empty_source() {
        assert_eq!(crop_rect(0, 10, ratio(4, 3)).width, 0);
    }

    // ── crop_to_aspect ───────────────────────────────────────────────

    #[test]
    fn crop_to_aspect_downscales_to_max_width() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1600, 1600));
        let out = crop_to_aspect(&img, ratio(4, 3), 800);
        assert_eq!((out.width(), out.height()), (800, 600));
    }

    #[test]
    fn crop_to_aspect_never_upscales() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 40));
        let out = crop_to_aspect(&img, ratio(4, 3), 800);
        assert_eq!((out.width(), out.height()), (40, 30));
    }

    #[test]
    fn crop_to_aspect_zero_max_width_keeps_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2000, 1000));
        let out = crop_to_aspect(&img, ratio(1, 1), 0);
        assert_eq!((out.width(), out.height()), (1000, 1000));
    }

    #[test]
    fn crop_to_aspect_keeps_center() {
        // Left and right thirds red, middle green: a square crop keeps only green.
        let img = RgbImage::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) { Rgb([0, 255, 0]) } else { Rgb([255, 0, 0]) }
        });
        let out = crop_to_aspect(&DynamicImage::ImageRgb8(img), ratio(1, 1), 0).to_rgb8();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(0, 50), &Rgb([0, 255, 0]));
        assert_eq!(out.get_pixel(99, 50), &Rgb([0, 255, 0]));
    }

    // ── prepare_upload ───────────────────────────────────────────────

    #[test]
    fn prepare_upload_writes_jpeg() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("wide.png");
        RgbImage::from_pixel(400, 200, Rgb([10, 20, 30])).save(&src).unwrap();

        let out_dir = dir.path().join("out");
        let dest = prepare_upload(&src, &out_dir, ratio(4, 3), 120, 85).unwrap();

        assert_eq!(dest, out_dir.join("wide.jpg"));
        assert_eq!(image::image_dimensions(&dest).unwrap(), (120, 90));
        assert_eq!(
            image::ImageFormat::from_path(&dest).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn prepare_upload_same_stem_gets_own_file() {
        let dir = TempDir::new().unwrap();
        let red = dir.path().join("a").join("img.png");
        let blue = dir.path().join("b").join("img.png");
        std::fs::create_dir_all(red.parent().unwrap()).unwrap();
        std::fs::create_dir_all(blue.parent().unwrap()).unwrap();
        RgbImage::from_pixel(400, 300, Rgb([255, 0, 0])).save(&red).unwrap();
        RgbImage::from_pixel(400, 300, Rgb([0, 0, 255])).save(&blue).unwrap();

        let out_dir = dir.path().join("out");
        let first = prepare_upload(&red, &out_dir, ratio(4, 3), 0, 90).unwrap();
        let second = prepare_upload(&blue, &out_dir, ratio(4, 3), 0, 90).unwrap();

        assert_eq!(first, out_dir.join("img.jpg"));
        assert_eq!(second, out_dir.join("img-1.jpg"));

        let first_px = *image::open(&first).unwrap().to_rgb8().get_pixel(200, 150);
        let second_px = *image::open(&second).unwrap().to_rgb8().get_pixel(200, 150);
        assert!(first_px[0] > 200 && first_px[2] < 50);
        assert!(second_px[2] > 200 && second_px[0] < 50);
    }

    #[test]
    fn prepare_upload_same_stem_different_extension() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("img.png");
        let jpg = dir.path().join("img.jpg");
        RgbImage::from_pixel(64, 48, Rgb([0, 255, 0])).save(&png).unwrap();
        RgbImage::from_pixel(64, 48, Rgb([0, 0, 0])).save(&jpg).unwrap();

        let out_dir = dir.path().join("out");
        let a = prepare_upload(&png, &out_dir, ratio(4, 3), 0, 90).unwrap();
        let b = prepare_upload(&jpg, &out_dir, ratio(4, 3), 0, 90).unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 2);
    }

    #[test]
    fn prepare_upload_undecodable_source_fails() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("broken.jpg");
        std::fs::write(&src, b"not an image").unwrap();
        assert!(prepare_upload(&src, dir.path(), ratio(4, 3), 100, 80).is_err());
    }
}
