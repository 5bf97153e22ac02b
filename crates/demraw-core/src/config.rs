//! Conversion tunables, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Errors that can occur while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Border-padding heuristic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaddingConfig {
    /// Run the heuristic at all.
    #[serde(rename = "detect_padding")]
    pub enabled: bool,
    /// Minimum border band width in pixels.
    pub min_border_pixels: usize,
    /// Border band is `min(width, height) / border_fraction_divisor` pixels wide.
    pub border_fraction_divisor: usize,
    /// Border zero ratio that must be exceeded.
    pub border_zero_ratio_threshold: f64,
    /// Border zero ratio must exceed this multiple of the center ratio.
    pub border_to_center_factor: f64,
    /// Center band as fractions of each dimension.
    pub center_band: (f64, f64),
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_border_pixels: PADDING_MIN_BORDER,
            border_fraction_divisor: PADDING_BORDER_DIVISOR,
            border_zero_ratio_threshold: PADDING_BORDER_RATIO,
            border_to_center_factor: PADDING_BORDER_TO_CENTER,
            center_band: (CENTER_BAND_START, CENTER_BAND_END),
        }
    }
}

/// Full converter configuration.
///
/// On disk the padding tunables sit at the top level next to
/// `pixel_square_tolerance`; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigFile", into = "ConfigFile")]
pub struct ConvertConfig {
    pub padding: PaddingConfig,
    /// Tolerance when deciding whether pixels are square.
    pub pixel_square_tolerance: f64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            padding: PaddingConfig::default(),
            pixel_square_tolerance: PIXEL_SQUARE_TOLERANCE,
        }
    }
}

/// Flat JSON layout of [`ConvertConfig`].
#[derive(Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    detect_padding: bool,
    min_border_pixels: usize,
    border_fraction_divisor: usize,
    border_zero_ratio_threshold: f64,
    border_to_center_factor: f64,
    center_band: (f64, f64),
    pixel_square_tolerance: f64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConvertConfig::default().into()
    }
}

impl From<ConfigFile> for ConvertConfig {
    fn from(f: ConfigFile) -> Self {
        Self {
            padding: PaddingConfig {
                enabled: f.detect_padding,
                min_border_pixels: f.min_border_pixels,
                border_fraction_divisor: f.border_fraction_divisor,
                border_zero_ratio_threshold: f.border_zero_ratio_threshold,
                border_to_center_factor: f.border_to_center_factor,
                center_band: f.center_band,
            },
            pixel_square_tolerance: f.pixel_square_tolerance,
        }
    }
}

impl From<ConvertConfig> for ConfigFile {
    fn from(c: ConvertConfig) -> Self {
        let p = c.padding;
        Self {
            detect_padding: p.enabled,
            min_border_pixels: p.min_border_pixels,
            border_fraction_divisor: p.border_fraction_divisor,
            border_zero_ratio_threshold: p.border_zero_ratio_threshold,
            border_to_center_factor: p.border_to_center_factor,
            center_band: p.center_band,
            pixel_square_tolerance: c.pixel_square_tolerance,
        }
    }
}

impl ConvertConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.padding;
        if p.border_fraction_divisor == 0 {
            return Err(ConfigError::Invalid("border_fraction_divisor must be > 0".into()));
        }
        let (start, end) = p.center_band;
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start >= end {
            return Err(ConfigError::Invalid(format!(
                "center_band must satisfy 0 <= start < end <= 1, got ({start}, {end})"
            )));
        }
        if self.pixel_square_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "pixel_square_tolerance must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
