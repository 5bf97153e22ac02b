//! Fundamental raster geometry and elevation types.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::{HEIGHTMAP_MAX, UTM_ZONE_COUNT, UTM_ZONE_WIDTH_DEG};
use crate::enums::Hemisphere;

/// Affine geotransform mapping pixel (col, row) to world (x, y).
///
/// Coefficient order follows the GDAL convention:
/// `(origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height)`.
/// `pixel_height` is negative for north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

/// World coordinates of the four raster corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub top_left: DVec2,
    pub top_right: DVec2,
    pub bottom_left: DVec2,
    pub bottom_right: DVec2,
}

impl Corners {
    pub fn iter(&self) -> impl Iterator<Item = DVec2> {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right].into_iter()
    }
}

impl Default for AffineTransform {
    /// Pixel space with a flipped Y axis, used when a raster carries no georeferencing.
    fn default() -> Self {
        Self::from_coefficients([0.0, 1.0, 0.0, 0.0, 0.0, -1.0])
    }
}

impl AffineTransform {
    pub fn from_coefficients(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    /// North-up transform with square pixels anchored at the top-left corner.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self::from_coefficients([origin_x, pixel_size, 0.0, origin_y, 0.0, -pixel_size])
    }

    /// Map a (possibly fractional) pixel coordinate to world space.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> DVec2 {
        DVec2::new(
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Transform of a window whose top-left pixel is (col, row) in this raster.
    pub fn offset_by(&self, col: f64, row: f64) -> Self {
        let origin = self.pixel_to_world(col, row);
        Self {
            origin_x: origin.x,
            origin_y: origin.y,
            ..*self
        }
    }

    /// World-space step of one column.
    pub fn column_step(&self) -> DVec2 {
        DVec2::new(self.pixel_width, self.col_rotation)
    }

    /// World-space step of one row.
    pub fn row_step(&self) -> DVec2 {
        DVec2::new(self.row_rotation, self.pixel_height)
    }

    /// Corner coordinates of a `cols × rows` raster.
    pub fn corners(&self, cols: usize, rows: usize) -> Corners {
        let (c, r) = (cols as f64, rows as f64);
        Corners {
            top_left: self.pixel_to_world(0.0, 0.0),
            top_right: self.pixel_to_world(c, 0.0),
            bottom_left: self.pixel_to_world(0.0, r),
            bottom_right: self.pixel_to_world(c, r),
        }
    }

    /// World coordinate of the pixel-space centroid `(cols / 2, rows / 2)`.
    pub fn center(&self, cols: usize, rows: usize) -> DVec2 {
        self.pixel_to_world(cols as f64 / 2.0, rows as f64 / 2.0)
    }
}

/// Elevation range over valid terrain pixels. Invariant: `max >= min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    pub min: f32,
    pub max: f32,
}

impl ElevationRange {
    /// Returns `None` if `max < min` or either bound is NaN.
    pub fn new(min: f32, max: f32) -> Option<Self> {
        (max >= min).then_some(Self { min, max })
    }

    /// Min/max over the samples selected by `valid`. `None` if nothing is selected.
    pub fn over_valid(samples: &[f32], valid: &[bool]) -> Option<Self> {
        let mut bounds: Option<(f32, f32)> = None;
        for (&v, &ok) in samples.iter().zip(valid) {
            if !ok {
                continue;
            }
            bounds = Some(match bounds {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        bounds.and_then(|(min, max)| Self::new(min, max))
    }

    /// Height variation `max - min`.
    pub fn variation(&self) -> f32 {
        self.max - self.min
    }

    pub fn is_flat(&self) -> bool {
        self.max == self.min
    }

    /// Reconstruct an elevation from a quantized heightmap value.
    pub fn decode(&self, value: u16) -> f64 {
        self.min as f64 + (value as f64 / HEIGHTMAP_MAX as f64) * self.variation() as f64
    }
}

/// Real-world terrain size in linear units (meters when the source is metric).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainExtent {
    /// East-west span.
    pub size_x: f64,
    /// North-south span.
    pub size_z: f64,
}

impl TerrainExtent {
    pub fn new(size_x: f64, size_z: f64) -> Self {
        Self { size_x, size_z }
    }
}

/// 6-degree UTM longitude band paired with a hemisphere.
///
/// The zone number is not clamped: longitude exactly 180° yields zone 61,
/// which has no valid EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    pub zone: i32,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        let zone = ((lon + 180.0) / UTM_ZONE_WIDTH_DEG).floor() as i32 + 1;
        Self {
            zone,
            hemisphere: Hemisphere::from_latitude(lat),
        }
    }

    /// WGS84 / UTM EPSG identifier (`32600 + zone` or `32700 + zone`).
    pub fn epsg(&self) -> i32 {
        self.hemisphere.epsg_base() as i32 + self.zone
    }

    /// True for zones 1..=60.
    pub fn is_standard(&self) -> bool {
        (1..=UTM_ZONE_COUNT as i32).contains(&self.zone)
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_world_north_up() {
        let gt = AffineTransform::north_up(500_000.0, 4_000_000.0, 30.0);
        let p = gt.pixel_to_world(10.0, 20.0);
        assert_eq!(p, DVec2::new(500_300.0, 3_999_400.0));
    }

    #[test]
    fn test_pixel_to_world_rotated() {
        let gt = AffineTransform::from_coefficients([100.0, 2.0, 0.5, 200.0, 0.25, -3.0]);
        let p = gt.pixel_to_world(4.0, 6.0);
        // x = 100 + 4*2 + 6*0.5, y = 200 + 4*0.25 + 6*-3
        assert!((p.x - 111.0).abs() < 1e-12);
        assert!((p.y - 183.0).abs() < 1e-12);
    }

    #[test]
    fn test_offset_preserves_pixel_mapping() {
        let gt = AffineTransform::from_coefficients([10.0, 1.5, 0.1, 50.0, 0.2, -1.5]);
        let shifted = gt.offset_by(7.0, 3.0);
        for (c, r) in [(0.0, 0.0), (2.0, 5.0), (9.5, 1.25)] {
            let a = shifted.pixel_to_world(c, r);
            let b = gt.pixel_to_world(c + 7.0, r + 3.0);
            assert!((a - b).length() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn test_center_uses_fractional_centroid() {
        let pixel = 0.01;
        let (lon, lat) = (-46.6, -23.5);
        let gt = AffineTransform::north_up(lon - 50.5 * pixel, lat + 50.5 * pixel, pixel);
        let c = gt.center(101, 101);
        assert!((c.x - lon).abs() < 1e-9);
        assert!((c.y - lat).abs() < 1e-9);
    }

    #[test]
    fn test_elevation_range_over_valid() {
        let samples = [5.0, -9999.0, 12.0, 7.5];
        let valid = [true, false, true, true];
        let range = ElevationRange::over_valid(&samples, &valid).unwrap();
        assert_eq!(range.min, 5.0);
        assert_eq!(range.max, 12.0);
        assert_eq!(range.variation(), 7.0);
    }

    #[test]
    fn test_elevation_range_empty() {
        assert!(ElevationRange::over_valid(&[1.0, 2.0], &[false, false]).is_none());
        assert!(ElevationRange::new(3.0, 2.0).is_none());
        assert!(ElevationRange::new(f32::NAN, 2.0).is_none());
    }

    #[test]
    fn test_decode_extremes() {
        let range = ElevationRange::new(100.0, 300.0).unwrap();
        assert_eq!(range.decode(0), 100.0);
        assert_eq!(range.decode(u16::MAX), 300.0);
    }

    #[test]
    fn test_utm_zone_formula() {
        let cases = [
            (-180.0, 1),
            (-177.0, 1),
            (0.0, 31),
            (3.0, 31),
            (177.0, 60),
            (180.0, 61),
        ];
        for (lon, expected) in cases {
            let zone = UtmZone::from_lon_lat(lon, 10.0);
            assert_eq!(zone.zone, expected, "lon {lon}");
        }
    }

    #[test]
    fn test_utm_zone_hemisphere_codes() {
        let north = UtmZone::from_lon_lat(-122.4, 40.0);
        assert_eq!(north.zone, 10);
        assert_eq!(north.epsg(), 32610);
        assert_eq!(north.to_string(), "EPSG:32610");

        let south = UtmZone::from_lon_lat(-122.4, -40.0);
        assert_eq!(south.epsg(), 32710);

        let equator = UtmZone::from_lon_lat(0.0, 0.0);
        assert_eq!(equator.hemisphere, Hemisphere::North);
    }

    #[test]
    fn test_antimeridian_zone_is_not_standard() {
        let zone = UtmZone::from_lon_lat(180.0, 0.0);
        assert_eq!(zone.epsg(), 32661);
        assert!(!zone.is_standard());
        assert!(UtmZone::from_lon_lat(179.9, 0.0).is_standard());
    }
}
