//! Spatial references, the reprojection seam, and degree-to-meter scaling.
//!
//! The pipeline only ever needs `reproject(point, from, to)`, so the
//! reprojection engine sits behind the [`Reprojector`] trait. The default
//! engine is pure Rust (proj4rs + crs-definitions).

use std::fmt;
use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use demraw_core::constants::{METERS_PER_DEGREE, UTM_NORTH_BASE, UTM_SOUTH_BASE, UTM_ZONE_COUNT, WGS84_EPSG};

use crate::error::ProjectionError;

/// Coordinate system descriptor of a raster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialRef {
    /// EPSG authority code.
    Epsg(u32),
    /// Raw PROJ.4 definition string.
    Proj4(String),
    /// No usable coordinate system metadata.
    #[default]
    Unknown,
}

impl SpatialRef {
    pub fn wgs84() -> Self {
        SpatialRef::Epsg(WGS84_EPSG)
    }

    pub fn epsg_code(&self) -> Option<u32> {
        match self {
            SpatialRef::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    /// True for WGS84 / UTM zones (EPSG 32601-32660 north, 32701-32760 south).
    pub fn is_utm(&self) -> bool {
        let zones = 1..=UTM_ZONE_COUNT;
        match self.epsg_code() {
            Some(code) if code > UTM_SOUTH_BASE => zones.contains(&(code - UTM_SOUTH_BASE)),
            Some(code) if code > UTM_NORTH_BASE => zones.contains(&(code - UTM_NORTH_BASE)),
            _ => false,
        }
    }

    /// PROJ.4 definition, looked up in crs-definitions for EPSG codes.
    pub fn proj_string(&self) -> Result<String, ProjectionError> {
        match self {
            SpatialRef::Epsg(code) => u16::try_from(*code)
                .ok()
                .and_then(crs_definitions::from_code)
                .map(|def| def.proj4.to_string())
                .ok_or(ProjectionError::UnsupportedEpsg(*code)),
            SpatialRef::Proj4(def) => Ok(def.clone()),
            SpatialRef::Unknown => Err(ProjectionError::UnknownCrs),
        }
    }

    /// Whether this system uses longitude/latitude degrees.
    pub fn is_geographic(&self) -> bool {
        self.proj_string()
            .map(|s| s.contains("+proj=longlat") || s.contains("+proj=latlong"))
            .unwrap_or(false)
    }

    /// Short human-readable name for log lines.
    pub fn display_name(&self) -> String {
        match self {
            SpatialRef::Epsg(code) if self.is_utm() => {
                let (base, hemi) = if *code > UTM_SOUTH_BASE {
                    (UTM_SOUTH_BASE, 'S')
                } else {
                    (UTM_NORTH_BASE, 'N')
                };
                format!("WGS 84 / UTM zone {}{hemi}", code - base)
            }
            SpatialRef::Epsg(WGS84_EPSG) => "WGS 84".to_string(),
            SpatialRef::Epsg(code) => format!("EPSG:{code}"),
            SpatialRef::Proj4(def) => def.clone(),
            SpatialRef::Unknown => "Unknown".to_string(),
        }
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialRef::Epsg(code) => write!(f, "EPSG:{code}"),
            SpatialRef::Proj4(def) => f.write_str(def),
            SpatialRef::Unknown => f.write_str("Unknown"),
        }
    }
}

impl FromStr for SpatialRef {
    type Err = ProjectionError;

    /// Accepts `EPSG:<code>` (case-insensitive) or a `+proj=` definition.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(code) = trimmed
            .get(..5)
            .filter(|p| p.eq_ignore_ascii_case("epsg:"))
            .and_then(|_| trimmed[5..].trim().parse::<u32>().ok())
        {
            return Ok(SpatialRef::Epsg(code));
        }
        if trimmed.starts_with("+proj=") {
            return Ok(SpatialRef::Proj4(trimmed.to_string()));
        }
        Err(ProjectionError::Unparseable(trimmed.to_string()))
    }
}

/// Coordinate reprojection between two spatial references.
pub trait Reprojector {
    /// Reproject a world point. Geographic coordinates are (lon, lat) in degrees.
    fn reproject(
        &self,
        point: DVec2,
        from: &SpatialRef,
        to: &SpatialRef,
    ) -> Result<DVec2, ProjectionError>;
}

/// Reprojection through proj4rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proj4Reprojector;

impl Proj4Reprojector {
    fn build(srs: &SpatialRef) -> Result<(proj4rs::proj::Proj, bool), ProjectionError> {
        let definition = srs.proj_string()?;
        let proj = proj4rs::proj::Proj::from_proj_string(&definition).map_err(|e| {
            ProjectionError::InvalidDefinition {
                definition: definition.clone(),
                reason: format!("{e:?}"),
            }
        })?;
        Ok((proj, srs.is_geographic()))
    }
}

impl Reprojector for Proj4Reprojector {
    fn reproject(
        &self,
        point: DVec2,
        from: &SpatialRef,
        to: &SpatialRef,
    ) -> Result<DVec2, ProjectionError> {
        if from == to && *from != SpatialRef::Unknown {
            return Ok(point);
        }

        let (source, source_geographic) = Self::build(from)?;
        let (target, target_geographic) = Self::build(to)?;

        // proj4rs works in radians for geographic systems.
        let mut xyz = if source_geographic {
            (point.x.to_radians(), point.y.to_radians(), 0.0)
        } else {
            (point.x, point.y, 0.0)
        };
        proj4rs::transform::transform(&source, &target, &mut xyz)
            .map_err(|e| ProjectionError::TransformFailed(format!("{from} -> {to}: {e:?}")))?;

        let out = if target_geographic {
            DVec2::new(xyz.0.to_degrees(), xyz.1.to_degrees())
        } else {
            DVec2::new(xyz.0, xyz.1)
        };
        if !out.is_finite() {
            return Err(ProjectionError::TransformFailed(format!(
                "{from} -> {to}: non-finite result for ({}, {})",
                point.x, point.y
            )));
        }
        Ok(out)
    }
}

/// Equirectangular degree-to-meter scale anchored at a reference latitude.
///
/// Longitude degrees shrink with `cos(latitude)`; latitude degrees are
/// treated as constant.
#[derive(Debug, Clone, Copy)]
pub struct DegreeScale {
    /// Reference latitude in degrees.
    pub ref_lat: f64,
    /// Cached cos(ref_lat) for longitude scaling.
    cos_ref_lat: f64,
}

impl DegreeScale {
    pub fn new(ref_lat: f64) -> Self {
        Self {
            ref_lat,
            cos_ref_lat: ref_lat.to_radians().cos(),
        }
    }

    /// Meters per degree of longitude at the reference latitude.
    pub fn lon_scale(&self) -> f64 {
        METERS_PER_DEGREE * self.cos_ref_lat
    }

    /// Meters per degree of latitude.
    pub fn lat_scale(&self) -> f64 {
        METERS_PER_DEGREE
    }

    /// Convert a (lon, lat) span in degrees to meters.
    pub fn span_to_meters(&self, lon_span: f64, lat_span: f64) -> DVec2 {
        DVec2::new(lon_span * self.lon_scale(), lat_span * self.lat_scale())
    }
}
