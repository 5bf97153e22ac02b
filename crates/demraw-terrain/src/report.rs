//! Conversion report and the human-readable import settings block.
//!
//! The settings block is the only output channel a line-oriented caller
//! sees, so [`parse_settings`] recovers the numbers from those lines.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use demraw_core::enums::CoordinateKind;
use demraw_core::types::{ElevationRange, TerrainExtent, UtmZone};

use crate::extent::CropWindow;

/// Suffix on X/Z sizes when the source is not a UTM projection.
pub const UNITS_WARNING: &str = "(units may not be meters - check projection)";

/// Header line of the settings block.
pub const SETTINGS_HEADER: &str = "--- Suggested Import Settings ---";

/// Everything a conversion learned about its input and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub input_name: String,
    pub source_width: usize,
    pub source_height: usize,
    pub width: usize,
    pub height: usize,
    pub crop: Option<CropWindow>,
    pub source_crs: String,
    pub is_utm: bool,
    pub zone: Option<UtmZone>,
    pub coordinate_kind: CoordinateKind,
    pub extent: TerrainExtent,
    pub range: ElevationRange,
    pub sentinel_excluded: usize,
    pub padding_detected: bool,
    pub padding_excluded: usize,
    pub output_path: Option<String>,
}

impl ConversionReport {
    /// Height variation `max - min`.
    pub fn variation(&self) -> f32 {
        self.range.variation()
    }
}

/// Render the settings block as individual lines.
pub fn render_settings(report: &ConversionReport) -> Vec<String> {
    let size = |value: f64| {
        if report.is_utm {
            format!("{value:.2}m")
        } else {
            format!("{value:.2} {UNITS_WARNING}")
        }
    };
    vec![
        SETTINGS_HEADER.to_string(),
        format!("Resolution (Width/Height): {}x{}", report.width, report.height),
        String::new(),
        "Terrain Size:".to_string(),
        format!("  X: {}", size(report.extent.size_x)),
        format!("  Y: {:.2}m", report.variation()),
        format!("  Z: {}", size(report.extent.size_z)),
        String::new(),
        "Elevation Range (for reference):".to_string(),
        format!("  Min Height: {:.2}m", report.range.min),
        format!("  Max Height: {:.2}m", report.range.max),
    ]
}

/// Errors from [`parse_settings`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Missing value in settings: {0}")]
    Missing(&'static str),
    #[error("Invalid {field} value '{text}'")]
    Invalid { field: &'static str, text: String },
}

/// Values recovered from a settings block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub width: usize,
    pub height: usize,
    pub size_x: Option<f64>,
    pub size_z: Option<f64>,
    pub variation: f64,
    pub min_height: f64,
    pub max_height: f64,
}

/// First number after the colon, with any trailing `m` removed.
fn number_after_colon(line: &str, field: &'static str) -> Result<f64, SettingsError> {
    let text = line
        .split_once(':')
        .map(|(_, rest)| rest.trim())
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or_default()
        .trim_end_matches('m');
    text.parse().map_err(|_| SettingsError::Invalid {
        field,
        text: text.to_string(),
    })
}

/// Recover the settings from log lines. Unrelated lines are ignored.
///
/// A missing `Y:` line is derived from the min/max heights.
pub fn parse_settings<I, S>(lines: I) -> Result<ImportSettings, SettingsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resolution = None;
    let (mut size_x, mut size_z, mut variation) = (None, None, None);
    let (mut min_height, mut max_height) = (None, None);

    for line in lines {
        let line = line.as_ref();
        if line.contains("Resolution (Width/Height):") {
            let dims = line.split_once(':').map(|(_, r)| r.trim()).unwrap_or_default();
            let parsed = dims
                .split_once('x')
                .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
            resolution = Some(parsed.ok_or_else(|| SettingsError::Invalid {
                field: "resolution",
                text: dims.to_string(),
            })?);
        } else if line.starts_with("  X:") {
            size_x = Some(number_after_colon(line, "X")?);
        } else if line.starts_with("  Y:") {
            variation = Some(number_after_colon(line, "Y")?);
        } else if line.starts_with("  Z:") {
            size_z = Some(number_after_colon(line, "Z")?);
        } else if line.starts_with("  Min Height:") {
            min_height = Some(number_after_colon(line, "min height")?);
        } else if line.starts_with("  Max Height:") {
            max_height = Some(number_after_colon(line, "max height")?);
        }
    }

    let (width, height) = resolution.ok_or(SettingsError::Missing("resolution"))?;
    let min_height = min_height.ok_or(SettingsError::Missing("min height"))?;
    let max_height = max_height.ok_or(SettingsError::Missing("max height"))?;
    Ok(ImportSettings {
        width,
        height,
        size_x,
        size_z,
        variation: variation.unwrap_or(max_height - min_height),
        min_height,
        max_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(is_utm: bool) -> ConversionReport {
        ConversionReport {
            input_name: "dem.tif".into(),
            source_width: 1200,
            source_height: 1000,
            width: 1000,
            height: 1000,
            crop: Some(CropWindow {
                x_offset: 100,
                y_offset: 0,
                size: 1000,
            }),
            source_crs: "WGS 84 / UTM zone 33N".into(),
            is_utm,
            zone: None,
            coordinate_kind: CoordinateKind::Projected,
            extent: TerrainExtent::new(30_000.0, 30_000.0),
            range: ElevationRange::new(112.5, 1321.5).unwrap(),
            sentinel_excluded: 0,
            padding_detected: false,
            padding_excluded: 0,
            output_path: None,
        }
    }

    #[test]
    fn test_render_utm() {
        let lines = render_settings(&report(true));
        assert_eq!(lines[1], "Resolution (Width/Height): 1000x1000");
        assert_eq!(lines[4], "  X: 30000.00m");
        assert_eq!(lines[5], "  Y: 1209.00m");
        assert_eq!(lines[6], "  Z: 30000.00m");
        assert_eq!(lines[9], "  Min Height: 112.50m");
        assert_eq!(lines[10], "  Max Height: 1321.50m");
    }

    #[test]
    fn test_render_non_utm_flags_units() {
        let lines = render_settings(&report(false));
        assert_eq!(
            lines[4],
            "  X: 30000.00 (units may not be meters - check projection)"
        );
        assert!(lines[6].ends_with(UNITS_WARNING));
        // height variation is always meters
        assert_eq!(lines[5], "  Y: 1209.00m");
    }

    #[test]
    fn test_parse_rendered_lines() {
        for utm in [true, false] {
            let parsed = parse_settings(render_settings(&report(utm))).unwrap();
            assert_eq!((parsed.width, parsed.height), (1000, 1000));
            assert_eq!(parsed.size_x, Some(30_000.0));
            assert_eq!(parsed.size_z, Some(30_000.0));
            assert_eq!(parsed.variation, 1209.0);
            assert_eq!(parsed.min_height, 112.5);
            assert_eq!(parsed.max_height, 1321.5);
        }
    }

    #[test]
    fn test_parse_derives_variation() {
        let lines = [
            "Original dimensions: 10x12. Cropping to 10x10 from center.",
            "Resolution (Width/Height): 10x10",
            "  Min Height: -5.00m",
            "  Max Height: 20.00m",
        ];
        let parsed = parse_settings(lines).unwrap();
        assert_eq!(parsed.variation, 25.0);
        assert_eq!(parsed.size_x, None);
    }

    #[test]
    fn test_parse_missing_and_invalid() {
        assert_eq!(
            parse_settings(["  Min Height: 1.00m"]),
            Err(SettingsError::Missing("resolution"))
        );
        assert!(matches!(
            parse_settings(["Resolution (Width/Height): tenxten"]),
            Err(SettingsError::Invalid { field: "resolution", .. })
        ));
    }

    #[test]
    fn test_report_json_roundtrip() {
        let r = report(true);
        let json = serde_json::to_string_pretty(&r).unwrap();
        let back: ConversionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
