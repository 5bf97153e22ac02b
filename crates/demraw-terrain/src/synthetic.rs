//! Deterministic synthetic elevation rasters for demos and tests.
//!
//! Terrain is a sum of smooth ridges and hills plus seeded jitter from
//! `ChaCha8Rng`, so the same builder always yields the same samples.
//! Optional zero-filled border padding and no-data holes reproduce the
//! artifacts the converter has to filter out.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use demraw_core::types::{AffineTransform, UtmZone};

use crate::error::RasterError;
use crate::projection::SpatialRef;
use crate::raster::Raster;

/// Default no-data value written into holes.
pub const DEFAULT_NODATA: f32 = -9999.0;

/// Where the synthetic raster sits on the globe.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticGeoref {
    /// WGS84 degrees around `center` (lon, lat).
    Geographic { center: DVec2, pixel_deg: f64 },
    /// Metric UTM coordinates with the top-left corner at `origin`.
    Utm {
        zone: UtmZone,
        origin: DVec2,
        pixel_size: f64,
    },
    /// Plain pixel coordinates with no spatial reference.
    None,
}

impl Default for SyntheticGeoref {
    fn default() -> Self {
        // Zone 33N, around 15°E 52°N
        SyntheticGeoref::Utm {
            zone: UtmZone::from_lon_lat(15.0, 52.0),
            origin: DVec2::new(450_000.0, 5_800_000.0),
            pixel_size: 30.0,
        }
    }
}

/// Builder for a synthetic DEM.
#[derive(Debug, Clone)]
pub struct SyntheticDem {
    width: usize,
    height: usize,
    seed: u64,
    base_elevation: f32,
    relief: f32,
    padding: usize,
    holes: usize,
    nodata: Option<f32>,
    georef: SyntheticGeoref,
}

impl Default for SyntheticDem {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            seed: 42,
            base_elevation: 100.0,
            relief: 1200.0,
            padding: 0,
            holes: 0,
            nodata: None,
            georef: SyntheticGeoref::default(),
        }
    }
}

impl SyntheticDem {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Lowest terrain elevation and the height of the tallest ridge above it.
    pub fn elevation(mut self, base: f32, relief: f32) -> Self {
        self.base_elevation = base;
        self.relief = relief;
        self
    }

    /// Zero-fill a band `pixels` wide along every edge.
    pub fn padding(mut self, pixels: usize) -> Self {
        self.padding = pixels;
        self
    }

    /// Punch `count` randomly placed no-data holes into the terrain.
    pub fn holes(mut self, count: usize) -> Self {
        self.holes = count;
        if self.nodata.is_none() {
            self.nodata = Some(DEFAULT_NODATA);
        }
        self
    }

    /// Declare a no-data value even if no holes are punched.
    pub fn nodata(mut self, value: f32) -> Self {
        self.nodata = Some(value);
        self
    }

    pub fn georef(mut self, georef: SyntheticGeoref) -> Self {
        self.georef = georef;
        self
    }

    /// Geographic raster of `pixel_deg` pixels centered on (lon, lat).
    pub fn geographic(self, lon: f64, lat: f64, pixel_deg: f64) -> Self {
        self.georef(SyntheticGeoref::Geographic {
            center: DVec2::new(lon, lat),
            pixel_deg,
        })
    }

    fn transform_and_srs(&self) -> (AffineTransform, SpatialRef) {
        match &self.georef {
            SyntheticGeoref::Geographic { center, pixel_deg } => {
                let half = DVec2::new(self.width as f64, self.height as f64) * *pixel_deg / 2.0;
                let gt = AffineTransform::north_up(center.x - half.x, center.y + half.y, *pixel_deg);
                (gt, SpatialRef::wgs84())
            }
            SyntheticGeoref::Utm {
                zone,
                origin,
                pixel_size,
            } => {
                let gt = AffineTransform::north_up(origin.x, origin.y, *pixel_size);
                (gt, SpatialRef::Epsg(zone.epsg() as u32))
            }
            SyntheticGeoref::None => (AffineTransform::default(), SpatialRef::Unknown),
        }
    }

    /// Generate the raster.
    pub fn build(&self) -> Result<Raster, RasterError> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        let jitter = self.relief * 0.01;

        let mut samples = Vec::with_capacity(self.width * self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let nx = col as f64 / self.width as f64;
                let ny = 1.0 - row as f64 / self.height as f64;
                let shape = terrain_shape(nx, ny, phase) as f32;
                let noise: f32 = if jitter > 0.0 {
                    rng.gen_range(0.0..jitter)
                } else {
                    0.0
                };
                samples.push(self.base_elevation + self.relief * shape + noise);
            }
        }

        if self.padding > 0 {
            let p = self.padding;
            for row in 0..self.height {
                for col in 0..self.width {
                    let edge = row < p || col < p || row + p >= self.height || col + p >= self.width;
                    if edge {
                        samples[row * self.width + col] = 0.0;
                    }
                }
            }
        }

        if let Some(nodata) = self.nodata {
            for _ in 0..self.holes {
                let i = rng.gen_range(0..samples.len());
                samples[i] = nodata;
            }
        }

        let (transform, spatial_ref) = self.transform_and_srs();
        log::debug!(
            "synthetic {}x{} seed {} padding {} holes {} crs {spatial_ref}",
            self.width,
            self.height,
            self.seed,
            self.padding,
            self.holes
        );
        Raster::new(
            self.width,
            self.height,
            samples,
            transform,
            spatial_ref,
            self.nodata,
        )
    }
}

/// Terrain shape in [0, 1] at normalized coordinates.
/// nx: 0=west, 1=east. ny: 0=south, 1=north.
fn terrain_shape(nx: f64, ny: f64, phase: f64) -> f64 {
    // Main ridge running diagonally, rising to the north
    let ridge_line = 0.5 + 0.15 * (nx * 6.0 + phase).sin();
    let ridge = (-((ny - ridge_line) * 6.0).powi(2)).exp() * (0.4 + 0.6 * ny);

    let hill1 = hill(nx, ny, 0.25, 0.3, 0.12, 0.5);
    let hill2 = hill(nx, ny, 0.75, 0.2, 0.08, 0.35);
    let rolling = 0.08 * ((nx * 14.0 + phase).sin() * (ny * 11.0).cos() * 0.5 + 0.5);

    (ridge.max(hill1).max(hill2) + rolling).clamp(0.0, 1.0)
}

/// Round hill at (cx, cy) with radius r and peak height.
fn hill(nx: f64, ny: f64, cx: f64, cy: f64, r: f64, peak: f64) -> f64 {
    let d2 = ((nx - cx) / r).powi(2) + ((ny - cy) / r).powi(2);
    if d2 > 1.0 {
        return 0.0;
    }
    let t = 1.0 - d2;
    peak * t * t
}
