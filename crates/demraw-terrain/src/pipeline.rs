//! End-to-end raster to RAW heightmap conversion.
//!
//! Stages run in a fixed order on the calling thread:
//! open, zone (diagnostic), crop, projection check, classify, quantize,
//! dimensions, write. The sink is polled for cancellation before open, crop,
//! classify, quantize, dimensions and write. Nothing is written until the last stage, and the RAW
//! writer only moves its temporary file into place on success.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use demraw_core::config::ConvertConfig;
use demraw_core::events::ProgressSink;
use demraw_core::types::UtmZone;

use crate::dimensions::terrain_extent;
use crate::error::ConvertError;
use crate::extent::normalize;
use crate::geotiff;
use crate::projection::{Proj4Reprojector, Reprojector};
use crate::quantize::{quantize, HeightmapBuffer};
use crate::raster::Raster;
use crate::raw::write_raw;
use crate::report::{render_settings, ConversionReport};
use crate::validity::classify;
use crate::zone::resolve_zone;

/// A finished conversion that has not been written yet.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub report: ConversionReport,
    pub heightmap: HeightmapBuffer,
}

/// Raster to heightmap converter.
pub struct Converter {
    config: ConvertConfig,
    reprojector: Box<dyn Reprojector>,
    require_zone: bool,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertConfig::default())
    }
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            reprojector: Box::new(Proj4Reprojector),
            require_zone: false,
        }
    }

    /// Replace the reprojection engine used for zone detection.
    pub fn with_reprojector(mut self, reprojector: Box<dyn Reprojector>) -> Self {
        self.reprojector = reprojector;
        self
    }

    /// Fail the conversion when no UTM zone can be resolved.
    pub fn require_zone(mut self, required: bool) -> Self {
        self.require_zone = required;
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Resolve the UTM zone of a raster's center.
    pub fn zone(&self, raster: &Raster, sink: &mut dyn ProgressSink) -> Option<UtmZone> {
        resolve_zone(raster, self.reprojector.as_ref(), sink)
    }

    /// Convert a raster in memory without writing anything.
    pub fn process(
        &self,
        raster: &Raster,
        input_name: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<Conversion, ConvertError> {
        sink.push_info(&format!("--- Processing: {input_name} ---"));

        let zone = self.zone(raster, sink);
        if zone.is_none() && self.require_zone {
            return Err(ConvertError::ZoneUnresolved);
        }

        checkpoint(sink, "crop")?;
        let (cols, rows) = (raster.width(), raster.height());
        let normalized = normalize(raster)?;
        match normalized.window {
            None => sink.push_info(&format!(
                "Image is already square ({cols}x{rows}). Skipping crop."
            )),
            Some(w) => sink.push_info(&format!(
                "Original dimensions: {cols}x{rows}. Cropping to {0}x{0} from center.",
                w.size
            )),
        }
        let square: &Raster = &normalized.raster;

        let srs = &square.spatial_ref;
        let is_utm = srs.is_utm();
        if is_utm {
            sink.push_info(&format!(
                "Input projection: {} ({srs}) - UTM detected",
                srs.display_name()
            ));
        } else {
            sink.push_info(&format!(
                "Warning: Input projection appears to be {} (not UTM).",
                srs.display_name()
            ));
            sink.push_info("For best results, reproject to UTM before converting.");
            sink.push_info(
                "Processing will continue, but the terrain import may require manual scaling.",
            );
        }

        checkpoint(sink, "classify")?;
        let (width, height) = (square.width(), square.height());
        let classification = classify(
            square.samples(),
            width,
            height,
            square.nodata,
            &self.config.padding,
        );
        if !classification.mask.any_valid() {
            return Err(ConvertError::NoValidPixels);
        }

        checkpoint(sink, "quantize")?;
        let quantized =
            quantize(square.samples(), &classification.mask).ok_or(ConvertError::NoValidPixels)?;
        if classification.padding_detected {
            // Counts every masked pixel, sentinels included.
            sink.push_info(&format!(
                "Padding detected in borders and excluded from height calculation ({} pixels)",
                classification.mask.excluded_count()
            ));
        }

        checkpoint(sink, "dimensions")?;
        let (extent, coordinate_kind) = terrain_extent(
            &square.transform,
            width,
            height,
            self.config.pixel_square_tolerance,
        );

        let report = ConversionReport {
            input_name: input_name.to_string(),
            source_width: cols,
            source_height: rows,
            width,
            height,
            crop: normalized.window,
            source_crs: srs.display_name(),
            is_utm,
            zone,
            coordinate_kind,
            extent,
            range: quantized.range,
            sentinel_excluded: classification.sentinel_excluded,
            padding_detected: classification.padding_detected,
            padding_excluded: classification.padding_excluded,
            output_path: None,
        };
        for line in render_settings(&report) {
            sink.push_info(&line);
        }

        Ok(Conversion {
            report,
            heightmap: quantized.buffer,
        })
    }

    /// Convert a raster and write the heightmap to `output`.
    pub fn convert(
        &self,
        raster: &Raster,
        input_name: &str,
        output: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<ConversionReport, ConvertError> {
        let Conversion {
            mut report,
            heightmap,
        } = self.process(raster, input_name, sink)?;

        checkpoint(sink, "write")?;
        write_raw(&heightmap, output)?;
        report.output_path = Some(output.display().to_string());
        sink.push_info(&format!("SUCCESS! File saved to: {}", output.display()));
        Ok(report)
    }

    /// Open a GeoTIFF and convert it.
    pub fn convert_file(
        &self,
        input: &Path,
        output: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<ConversionReport, ConvertError> {
        checkpoint(sink, "open")?;
        let raster = geotiff::open(input).map_err(ConvertError::Open)?;
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        self.convert(&raster, &name, output, sink)
    }

    /// Convert a file, reporting any failure through `sink`.
    ///
    /// Returns `true` on success. Errors and panics never escape.
    pub fn run(&self, input: &Path, output: &Path, sink: &mut dyn ProgressSink) -> bool {
        self.try_run(input, output, sink).is_some()
    }

    /// Like [`Converter::run`], but hands back the report on success.
    pub fn try_run(
        &self,
        input: &Path,
        output: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Option<ConversionReport> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.convert_file(input, output, &mut *sink)
        }));
        let result = outcome
            .unwrap_or_else(|payload| Err(ConvertError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("conversion of {} failed: {e}", input.display());
                sink.push_info(&format!("Error: {e}"));
                None
            }
        }
    }
}

fn checkpoint(sink: &dyn ProgressSink, stage: &'static str) -> Result<(), ConvertError> {
    if sink.is_canceled() {
        return Err(ConvertError::Canceled(stage));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
