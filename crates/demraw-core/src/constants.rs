//! Conversion constants and default tuning parameters.

// --- Geodesy ---

/// Meters per degree of latitude (nearly constant across the globe).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// EPSG code of WGS84 geographic longitude/latitude.
pub const WGS84_EPSG: u32 = 4326;

/// Width of one UTM zone in degrees of longitude.
pub const UTM_ZONE_WIDTH_DEG: f64 = 6.0;

/// Number of standard UTM zones.
pub const UTM_ZONE_COUNT: u32 = 60;

/// EPSG base for WGS84 / UTM northern hemisphere zones (32601..=32660).
pub const UTM_NORTH_BASE: u32 = 32600;

/// EPSG base for WGS84 / UTM southern hemisphere zones (32701..=32760).
pub const UTM_SOUTH_BASE: u32 = 32700;

// --- Geographic detection ---

/// Longitude bound used to decide whether transform coordinates look like degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Latitude bound used to decide whether transform coordinates look like degrees.
pub const MAX_LATITUDE: f64 = 90.0;

/// Pixel sizes at or above this magnitude are never treated as degrees.
pub const GEOGRAPHIC_PIXEL_SIZE_LIMIT: f64 = 1.0;

/// Tolerance when comparing the two pixel-direction magnitudes.
pub const PIXEL_SQUARE_TOLERANCE: f64 = 0.0001;

// --- Padding heuristic ---

/// Minimum border band width in pixels.
pub const PADDING_MIN_BORDER: usize = 5;

/// Border band is `min(width, height) / PADDING_BORDER_DIVISOR` pixels wide (5%).
pub const PADDING_BORDER_DIVISOR: usize = 20;

/// Border zero ratio above which zeros may be padding.
pub const PADDING_BORDER_RATIO: f64 = 0.30;

/// Border zero ratio must exceed the center ratio by this factor.
pub const PADDING_BORDER_TO_CENTER: f64 = 3.0;

/// Start of the center band as a fraction of each dimension.
pub const CENTER_BAND_START: f64 = 0.25;

/// End of the center band as a fraction of each dimension.
pub const CENTER_BAND_END: f64 = 0.75;

// --- Quantization ---

/// Largest quantized height value.
pub const HEIGHTMAP_MAX: u16 = u16::MAX;

/// Bytes per heightmap sample on disk.
pub const HEIGHTMAP_SAMPLE_BYTES: usize = 2;
