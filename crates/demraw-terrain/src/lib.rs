//! Elevation raster to 16-bit RAW heightmap conversion.
//!
//! GeoTIFF input, UTM zone detection, square cropping,
//! sentinel and padding exclusion, terrain sizing,
//! quantization, and the headerless RAW output format.

pub use demraw_core as core;

pub mod dimensions;
pub mod error;
pub mod extent;
pub mod geotiff;
pub mod pipeline;
pub mod projection;
pub mod quantize;
pub mod raster;
pub mod raw;
pub mod report;
pub mod synthetic;
pub mod validity;
pub mod zone;

// Re-export key types for convenience.
pub use error::{ConvertError, ProjectionError, RasterError};
pub use extent::{normalize, CropWindow, NormalizedRaster};
pub use pipeline::{Conversion, Converter};
pub use projection::{DegreeScale, Proj4Reprojector, Reprojector, SpatialRef};
pub use quantize::{quantize, HeightmapBuffer};
pub use raster::Raster;
pub use raw::{read_raw, write_raw, RawError, RawStats};
pub use report::{parse_settings, render_settings, ConversionReport, ImportSettings};
pub use synthetic::{SyntheticDem, SyntheticGeoref};
pub use validity::{classify, Classification, ExclusionStage, ValidityMask};
pub use zone::resolve_zone;
