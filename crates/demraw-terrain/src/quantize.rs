//! Linear 16-bit quantization of elevations.

use demraw_core::constants::{HEIGHTMAP_MAX, HEIGHTMAP_SAMPLE_BYTES};
use demraw_core::types::ElevationRange;

use crate::validity::ValidityMask;

/// Row-major unsigned 16-bit heightmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightmapBuffer {
    width: usize,
    height: usize,
    values: Vec<u16>,
}

impl HeightmapBuffer {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[u16] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u16> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.values[row * self.width + col])
    }

    /// Little-endian byte image, independent of host byte order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * HEIGHTMAP_SAMPLE_BYTES);
        for v in &self.values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }
}

/// Output of [`quantize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    pub buffer: HeightmapBuffer,
    pub range: ElevationRange,
}

/// Quantize `samples` over the range of the valid pixels in `mask`.
///
/// Invalid pixels take the minimum valid elevation before scaling, so they
/// come out as 0. Flat terrain produces an all-zero buffer. Returns `None`
/// when the mask has no valid pixel.
pub fn quantize(samples: &[f32], mask: &ValidityMask) -> Option<Quantized> {
    let range = ElevationRange::over_valid(samples, mask.as_slice())?;

    let values = if range.is_flat() {
        vec![0; samples.len()]
    } else {
        let min = range.min as f64;
        // widen before subtracting; the f32 difference can overflow
        let span = range.max as f64 - range.min as f64;
        samples
            .iter()
            .zip(mask.as_slice())
            .map(|(&s, &valid)| {
                let s = if valid { s as f64 } else { min };
                let normalized = (s - min) / span;
                (normalized * HEIGHTMAP_MAX as f64)
                    .floor()
                    .clamp(0.0, HEIGHTMAP_MAX as f64) as u16
            })
            .collect()
    };

    Some(Quantized {
        buffer: HeightmapBuffer {
            width: mask.width(),
            height: mask.height(),
            values,
        },
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validity;
    use demraw_core::config::PaddingConfig;

    fn all_valid(n: usize) -> ValidityMask {
        ValidityMask::all_valid(n, 1)
    }

    #[test]
    fn test_extremes_map_to_full_range() {
        let samples = [120.0, 250.5, 800.0, 433.0];
        let q = quantize(&samples, &all_valid(4)).unwrap();
        assert_eq!(q.range.min, 120.0);
        assert_eq!(q.range.max, 800.0);
        assert_eq!(q.buffer.values()[0], 0);
        assert_eq!(q.buffer.values()[2], 65535);
    }

    #[test]
    fn test_linear_midpoint() {
        let samples = [0.0, 50.0, 100.0];
        let q = quantize(&samples, &all_valid(3)).unwrap();
        // floor(0.5 * 65535)
        assert_eq!(q.buffer.values()[1], 32767);
    }

    #[test]
    fn test_span_wider_than_f32() {
        let samples = [-3.0e38, 0.0, 3.0e38];
        let q = quantize(&samples, &all_valid(3)).unwrap();
        assert!(q.range.variation().is_infinite());
        assert_eq!(q.buffer.values(), &[0, 32767, 65535]);
    }

    #[test]
    fn test_flat_terrain_is_all_zero() {
        let samples = [42.0; 9];
        let mask = ValidityMask::all_valid(3, 3);
        let q = quantize(&samples, &mask).unwrap();
        assert!(q.range.is_flat());
        assert_eq!(q.buffer.values(), &[0u16; 9]);
        assert_eq!((q.buffer.width(), q.buffer.height()), (3, 3));
    }

    #[test]
    fn test_excluded_pixels_fill_with_minimum() {
        let samples = [-9999.0, 10.0, 20.0, -9999.0];
        let c = validity::classify(&samples, 2, 2, Some(-9999.0), &PaddingConfig::default());
        let q = quantize(&samples, &c.mask).unwrap();
        assert_eq!(q.range.min, 10.0);
        assert_eq!(q.buffer.values(), &[0, 0, 65535, 0]);
    }

    #[test]
    fn test_no_valid_pixels() {
        let samples = [-9999.0; 4];
        let c = validity::classify(&samples, 2, 2, Some(-9999.0), &PaddingConfig::default());
        assert!(quantize(&samples, &c.mask).is_none());
    }

    #[test]
    fn test_le_bytes() {
        let samples = [0.0, 1.0];
        let q = quantize(&samples, &all_valid(2)).unwrap();
        assert_eq!(q.buffer.to_le_bytes(), vec![0x00, 0x00, 0xFF, 0xFF]);

        let samples = [0.0, 1.0, 2.0];
        let q = quantize(&samples, &all_valid(3)).unwrap();
        // 32767 = 0x7FFF, low byte first
        assert_eq!(&q.buffer.to_le_bytes()[2..4], &[0xFF, 0x7F]);
    }
}
