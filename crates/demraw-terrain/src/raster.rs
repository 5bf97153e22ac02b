//! Raster: a single-band elevation grid with its georeferencing.

use demraw_core::types::AffineTransform;

use crate::error::RasterError;
use crate::projection::SpatialRef;

/// Single-band elevation raster held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    /// Elevation samples, row-major (top-to-bottom, left-to-right).
    samples: Vec<f32>,
    /// Pixel-to-world mapping.
    pub transform: AffineTransform,
    /// Coordinate system of `transform`'s world coordinates.
    pub spatial_ref: SpatialRef,
    /// Declared no-data sentinel, if any.
    pub nodata: Option<f32>,
}

impl Raster {
    /// Create a raster from row-major samples.
    pub fn new(
        width: usize,
        height: usize,
        samples: Vec<f32>,
        transform: AffineTransform,
        spatial_ref: SpatialRef,
        nodata: Option<f32>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        if samples.len() != width * height {
            return Err(RasterError::SampleCount {
                width,
                height,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
            transform,
            spatial_ref,
            nodata,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at integer grid coordinates. `None` outside the raster.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.samples[row * self.width + col])
    }

    /// Copy a `cols × rows` pixel window whose top-left pixel is (col, row).
    ///
    /// The window keeps the same per-pixel world mapping: its origin is the
    /// world position of (col, row) in this raster. No resampling happens.
    pub fn window(
        &self,
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    ) -> Result<Raster, RasterError> {
        let fits = cols > 0
            && rows > 0
            && col.checked_add(cols).is_some_and(|end| end <= self.width)
            && row.checked_add(rows).is_some_and(|end| end <= self.height);
        if !fits {
            return Err(RasterError::WindowOutOfBounds {
                col,
                row,
                cols,
                rows,
                width: self.width,
                height: self.height,
            });
        }

        let mut samples = Vec::with_capacity(cols * rows);
        for r in row..row + rows {
            let start = r * self.width + col;
            samples.extend_from_slice(&self.samples[start..start + cols]);
        }

        Raster::new(
            cols,
            rows,
            samples,
            self.transform.offset_by(col as f64, row as f64),
            self.spatial_ref.clone(),
            self.nodata,
        )
    }
}
