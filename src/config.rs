use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::geocode;
use crate::imaging::AspectRatio;

/// Top-level configuration for chicago-oracle.
///
/// Controls which geocoding endpoints are queried, how uploads are cropped
/// and resized, and output behavior (dry run). Every section falls back to
/// its defaults when missing from the file.
///
/// # Loading
///
/// ```rust,no_run
/// use chicago_oracle::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.geocoding.user_agent = "my-photo-app/1.0 (ops@example.com)".into();
/// config.upload.output_dir = Some("./uploads".into());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reverse-geocoding provider endpoints.
    pub geocoding: GeocodingConfig,
    /// Crop/resize settings for prepared uploads.
    pub upload: UploadConfig,
    /// Output behavior (dry run).
    pub output: OutputConfig,
}

/// Reverse-geocoding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Nominatim `/reverse` endpoint (primary, street-level).
    pub primary_url: String,
    /// BigDataCloud `reverse-geocode-client` endpoint (secondary, coarse).
    pub secondary_url: String,
    /// `User-Agent` sent to Nominatim, which requires an identifying one.
    pub user_agent: String,
}

/// Controls how uploads are cropped, resized, and where they are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Feed frame shape, as `"W:H"`.
    pub aspect_ratio: AspectRatio,
    /// Maximum width of a prepared upload in pixels (0 = keep cropped size).
    pub max_width: u32,
    /// JPEG quality for prepared uploads (1–100).
    pub jpeg_quality: u8,
    /// Where prepared uploads are written. `None` skips preparation.
    pub output_dir: Option<String>,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, enrich and report without writing any prepared images.
    pub dry_run: bool,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            primary_url: geocode::NOMINATIM_URL.to_string(),
            secondary_url: geocode::BIGDATACLOUD_URL.to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            max_width: 1080,
            jpeg_quality: 85,
            output_dir: None,
        }
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.upload.jpeg_quality) {
            anyhow::bail!(
                "upload.jpeg_quality must be between 1 and 100 (got {})",
                self.upload.jpeg_quality
            );
        }
        if self.geocoding.user_agent.trim().is_empty() {
            anyhow::bail!("geocoding.user_agent must not be empty");
        }
        Ok(())
    }
}
