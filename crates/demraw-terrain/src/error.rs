//! Error types for raster input, reprojection, and conversion.

use std::path::PathBuf;

use thiserror::Error;

use crate::raw::RawError;

/// Errors raised while opening, decoding, or slicing a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TIFF decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("Invalid raster dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("Sample count {actual} does not match {width}x{height}")]
    SampleCount {
        width: usize,
        height: usize,
        actual: usize,
    },
    #[error("Window {cols}x{rows} at ({col}, {row}) exceeds raster {width}x{height}")]
    WindowOutOfBounds {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
        width: usize,
        height: usize,
    },
    #[error("Invalid GeoTIFF metadata: {0}")]
    Georeferencing(String),
}

/// Errors raised by a coordinate reprojection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Spatial reference is unknown")]
    UnknownCrs,
    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnsupportedEpsg(u32),
    #[error("Invalid projection definition '{definition}': {reason}")]
    InvalidDefinition { definition: String, reason: String },
    #[error("Transform failed: {0}")]
    TransformFailed(String),
    #[error("Unparseable spatial reference '{0}'")]
    Unparseable(String),
}

/// Errors that end a conversion run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Could not open input file: {0}")]
    Open(#[source] RasterError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("No valid terrain pixels found after filtering.")]
    NoValidPixels,
    #[error("Could not resolve a UTM zone for the raster center")]
    ZoneUnresolved,
    #[error("Conversion canceled before {0}")]
    Canceled(&'static str),
    #[error("Could not write output: {0}")]
    Write(#[from] RawError),
    #[error("Unexpected failure: {0}")]
    Panicked(String),
}
