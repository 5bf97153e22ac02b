//! UTM zone resolution for a raster's center point.

use demraw_core::events::ProgressSink;
use demraw_core::types::UtmZone;
use glam::DVec2;

use crate::error::ProjectionError;
use crate::projection::{Reprojector, SpatialRef};
use crate::raster::Raster;

/// Geodetic (lon, lat) of the raster's pixel-space centroid.
pub fn center_lon_lat(
    raster: &Raster,
    reprojector: &dyn Reprojector,
) -> Result<DVec2, ProjectionError> {
    let center = raster.transform.center(raster.width(), raster.height());
    reprojector.reproject(center, &raster.spatial_ref, &SpatialRef::wgs84())
}

/// Resolve the UTM zone containing the raster center.
///
/// Failures are reported through `sink` and yield `None`. The zone number
/// is not clamped, so a center exactly on the antimeridian resolves to
/// zone 61 (EPSG 32661/32761), which matches no real projection.
pub fn resolve_zone(
    raster: &Raster,
    reprojector: &dyn Reprojector,
    sink: &mut dyn ProgressSink,
) -> Option<UtmZone> {
    let lon_lat = match center_lon_lat(raster, reprojector) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("zone resolution failed for {}: {e}", raster.spatial_ref);
            sink.push_info(&format!("Error in zone detection: {e}"));
            return None;
        }
    };

    let zone = UtmZone::from_lon_lat(lon_lat.x, lon_lat.y);
    sink.push_info(&format!(
        "Detected center Lon/Lat: ({:.2}, {:.2})",
        lon_lat.x, lon_lat.y
    ));
    sink.push_info(&format!(
        "Auto-detected UTM EPSG code: {} (Zone {})",
        zone.epsg(),
        zone.zone
    ));
    if !zone.is_standard() {
        log::warn!("zone {} is outside 1..=60; EPSG:{} is not a valid UTM code", zone.zone, zone.epsg());
    }
    Some(zone)
}
