//! Real-world terrain size from the affine transform.
//!
//! Units are decided from the transform values alone. File metadata can
//! disagree with the coordinates actually stored, so it is not consulted.
//! A small projected raster near (0, 0) with sub-unit pixels is
//! indistinguishable from a geographic one and is treated as geographic.

use demraw_core::constants::{GEOGRAPHIC_PIXEL_SIZE_LIMIT, MAX_LATITUDE, MAX_LONGITUDE};
use demraw_core::enums::CoordinateKind;
use demraw_core::types::{AffineTransform, TerrainExtent};

use crate::projection::DegreeScale;

/// Classify the transform's world coordinates as degrees or linear units.
pub fn classify_coordinates(transform: &AffineTransform, cols: usize, rows: usize) -> CoordinateKind {
    let corners = transform.corners(cols, rows);
    let within_bounds = corners
        .iter()
        .all(|c| c.x.abs() <= MAX_LONGITUDE && c.y.abs() <= MAX_LATITUDE);
    let small_pixels = transform.pixel_width.abs() < GEOGRAPHIC_PIXEL_SIZE_LIMIT
        && transform.pixel_height.abs() < GEOGRAPHIC_PIXEL_SIZE_LIMIT;

    if within_bounds && small_pixels {
        CoordinateKind::Geographic
    } else {
        CoordinateKind::Projected
    }
}

/// Compute the X (east-west) and Z (north-south) size of a `cols × rows` raster.
///
/// Geographic spans are converted to meters at the center latitude and are
/// never averaged. Projected spans are corner-to-corner distances; when
/// the raster and its pixels are both square the two spans are averaged so
/// that they compare equal.
pub fn terrain_extent(
    transform: &AffineTransform,
    cols: usize,
    rows: usize,
    pixel_square_tolerance: f64,
) -> (TerrainExtent, CoordinateKind) {
    let kind = classify_coordinates(transform, cols, rows);
    let corners = transform.corners(cols, rows);

    let extent = match kind {
        CoordinateKind::Geographic => {
            let lon_span = (corners.top_right.x - corners.top_left.x).abs();
            let lat_span = (corners.bottom_left.y - corners.top_left.y).abs();
            let center_lat = (corners.top_left.y + corners.bottom_left.y) / 2.0;
            let meters = DegreeScale::new(center_lat).span_to_meters(lon_span, lat_span);
            TerrainExtent::new(meters.x, meters.y)
        }
        CoordinateKind::Projected => {
            let size_x = corners.top_left.distance(corners.top_right);
            let size_z = corners.top_left.distance(corners.bottom_left);

            let square_pixels = (transform.column_step().length() - transform.row_step().length())
                .abs()
                < pixel_square_tolerance;
            if cols == rows && square_pixels {
                let average = (size_x + size_z) / 2.0;
                TerrainExtent::new(average, average)
            } else {
                TerrainExtent::new(size_x, size_z)
            }
        }
    };
    log::debug!(
        "{} extent {:.3} x {:.3} for {cols}x{rows}",
        kind.label(),
        extent.size_x,
        extent.size_z
    );
    (extent, kind)
}
