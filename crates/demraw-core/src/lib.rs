//! Core types and definitions for the demraw heightmap exporter.
//!
//! This crate defines the vocabulary shared across the other crates:
//! geotransforms, elevation ranges, terrain extents, UTM zones,
//! progress sinks, configuration, and constants.
//! It performs no raster I/O.

pub mod config;
pub mod constants;
pub mod enums;
pub mod events;
pub mod types;

pub use config::{ConfigError, ConvertConfig, PaddingConfig};
pub use enums::{CoordinateKind, Hemisphere};
pub use events::{CancelFlag, ConsoleSink, LogSink, ProgressSink, RecordingSink};
pub use types::{AffineTransform, Corners, ElevationRange, TerrainExtent, UtmZone};

#[cfg(test)]
mod tests;
