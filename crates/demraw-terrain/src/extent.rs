//! Square-extent normalization by centered cropping.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::RasterError;
use crate::raster::Raster;

/// Pixel window of a centered square crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x_offset: usize,
    pub y_offset: usize,
    pub size: usize,
}

/// Centered `m × m` window for a `width × height` raster, `m = min(width, height)`.
///
/// Returns `None` when the raster is already square.
pub fn square_window(width: usize, height: usize) -> Option<CropWindow> {
    if width == height {
        return None;
    }
    let size = width.min(height);
    Some(CropWindow {
        x_offset: (width - size) / 2,
        y_offset: (height - size) / 2,
        size,
    })
}

/// A square raster, borrowed when the input was already square.
#[derive(Debug)]
pub struct NormalizedRaster<'a> {
    pub raster: Cow<'a, Raster>,
    /// The crop applied, or `None` if the input passed through.
    pub window: Option<CropWindow>,
}

impl NormalizedRaster<'_> {
    pub fn was_cropped(&self) -> bool {
        self.window.is_some()
    }
}

/// Reduce `raster` to its centered maximal square.
///
/// Square input is returned as a borrow without copying. Otherwise the
/// window is copied out with the origin shifted so every pixel keeps its
/// world position.
pub fn normalize(raster: &Raster) -> Result<NormalizedRaster<'_>, RasterError> {
    match square_window(raster.width(), raster.height()) {
        None => Ok(NormalizedRaster {
            raster: Cow::Borrowed(raster),
            window: None,
        }),
        Some(w) => {
            let cropped = raster.window(w.x_offset, w.y_offset, w.size, w.size)?;
            Ok(NormalizedRaster {
                raster: Cow::Owned(cropped),
                window: Some(w),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use demraw_core::types::AffineTransform;

    use super::*;
    use crate::projection::SpatialRef;

    fn ramp(width: usize, height: usize) -> Raster {
        let samples = (0..width * height).map(|i| i as f32).collect();
        Raster::new(
            width,
            height,
            samples,
            AffineTransform::north_up(0.0, 0.0, 1.0),
            SpatialRef::Epsg(32633),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_square_passes_through() {
        let raster = ramp(16, 16);
        let normalized = normalize(&raster).unwrap();
        assert!(!normalized.was_cropped());
        assert!(matches!(normalized.raster, Cow::Borrowed(_)));
        assert_eq!(*normalized.raster, raster);
    }

    #[test]
    fn test_window_offsets() {
        assert_eq!(
            square_window(101, 201),
            Some(CropWindow { x_offset: 0, y_offset: 50, size: 101 })
        );
        assert_eq!(
            square_window(200, 100),
            Some(CropWindow { x_offset: 50, y_offset: 0, size: 100 })
        );
        assert_eq!(square_window(64, 64), None);
    }

    #[test]
    fn test_window_bounds_hold_for_all_shapes() {
        for w in 1..40 {
            for h in 1..40 {
                let Some(win) = square_window(w, h) else {
                    assert_eq!(w, h);
                    continue;
                };
                assert_eq!(win.size, w.min(h));
                assert!(win.x_offset + win.size <= w);
                assert!(win.y_offset + win.size <= h);
                // centered within one pixel
                let slack_x = (w - win.size) - 2 * win.x_offset;
                let slack_y = (h - win.size) - 2 * win.y_offset;
                assert!(slack_x <= 1 && slack_y <= 1);
            }
        }
    }

    #[test]
    fn test_crop_selects_center_rows() {
        let raster = ramp(3, 7);
        let normalized = normalize(&raster).unwrap();
        let out = &normalized.raster;
        assert_eq!((out.width(), out.height()), (3, 3));
        // rows 2..5 of the 3-wide ramp
        assert_eq!(out.samples()[0], 6.0);
        assert_eq!(out.samples()[8], 14.0);
        assert_eq!(out.transform.origin_y, -2.0);
        assert_eq!(out.transform.origin_x, 0.0);
    }
}
