//! Bounding-box and lattice geometry with Earth-curvature correction.

use crate::error::RouteError;
use crate::models::{BoundingBox, GridShape};

pub const EARTH_RADIUS_M: f64 = 6.371e6;

/// Meters per degree of latitude, treated as constant over the small regions
/// this planner works with.
pub const METERS_PER_DEG_LAT: f64 = 111_045.0;

/// Normalize a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Radius of the circle of latitude at `lat`, in meters.
fn parallel_radius_m(lat: f64) -> f64 {
    lat.abs().to_radians().cos() * EARTH_RADIUS_M
}

/// Build the buffered search box around a start/end pair.
///
/// The box is centered on the endpoints and extends `0.5 * buffer_multiplier`
/// times the straight-line endpoint distance beyond them on every side. When
/// the endpoints are more than 180° of longitude apart the box covers the
/// shorter arc across the antimeridian, so `lon_min > lon_max` numerically.
pub fn compute_bounding_box(
    lat_start: f64,
    lon_start: f64,
    lat_end: f64,
    lon_end: f64,
    buffer_multiplier: f64,
) -> Result<BoundingBox, RouteError> {
    for lat in [lat_start, lat_end] {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RouteError::Geometry(format!("latitude {lat} out of range")));
        }
    }

    let lon_start = normalize_lon(lon_start);
    let lon_end = normalize_lon(lon_end);
    let lat_mid = 0.5 * (lat_start + lat_end);

    let dlon = lon_end - lon_start;
    let wraps = dlon.abs() > 180.0;
    let lon_angle_deg = if wraps { 360.0 - dlon.abs() } else { dlon.abs() };

    let lat_dist_m = (lat_end - lat_start).abs() * METERS_PER_DEG_LAT;
    let r_mid = parallel_radius_m(lat_mid);
    if r_mid <= 0.0 {
        return Err(RouteError::Geometry("midpoint latitude is at a pole".into()));
    }
    let lon_dist_m = r_mid * lon_angle_deg.to_radians();

    let d = (lat_dist_m * lat_dist_m + lon_dist_m * lon_dist_m).sqrt();
    if d <= 0.0 {
        return Err(RouteError::Geometry(
            "start and end coincide; no extent to route over".into(),
        ));
    }

    let half_lat_deg = (0.5 * buffer_multiplier * d / EARTH_RADIUS_M).to_degrees();
    let half_lon_deg = (0.5 * buffer_multiplier * d / r_mid).to_degrees();

    // Across the antimeridian the numerically larger longitude is the western
    // edge of the shorter arc, so the min/max sources swap.
    let (lon_west, lon_east) = if wraps {
        (lon_start.max(lon_end), lon_start.min(lon_end))
    } else {
        (lon_start.min(lon_end), lon_start.max(lon_end))
    };

    let bbox = BoundingBox {
        lat_min: (lat_start.min(lat_end) - half_lat_deg).max(-90.0),
        lat_max: (lat_start.max(lat_end) + half_lat_deg).min(90.0),
        lon_min: normalize_lon(lon_west - half_lon_deg),
        lon_max: normalize_lon(lon_east + half_lon_deg),
    };
    if bbox.lat_min >= bbox.lat_max {
        return Err(RouteError::Geometry(format!(
            "lat_min {} >= lat_max {}",
            bbox.lat_min, bbox.lat_max
        )));
    }
    Ok(bbox)
}

/// The box's extents in meters: (latitudinal, longitudinal), measured at the
/// mid latitude. These are the distances the edge-weight model divides into
/// cell spacings.
pub fn bbox_extent_meters(bbox: &BoundingBox) -> (f64, f64) {
    let lat_mid = 0.5 * (bbox.lat_min + bbox.lat_max);
    let lat_m = bbox.lat_span() * METERS_PER_DEG_LAT;
    let lon_m = parallel_radius_m(lat_mid) * bbox.lon_span().to_radians();
    (lat_m, lon_m)
}

/// Generate the movement lattice: `shape.ny` rows of `shape.nx` points,
/// row-major, row 0 along the northern edge and column 0 along the western
/// edge, corners inclusive.
pub fn grid_points(bbox: &BoundingBox, shape: GridShape) -> Vec<(f64, f64)> {
    assert!(
        shape.nx >= 2 && shape.ny >= 2,
        "grid needs at least 2 points per axis"
    );
    let mut points = Vec::with_capacity(shape.len());
    for row in 0..shape.ny {
        let lat = bbox.lat_at(row as f64 / (shape.ny - 1) as f64);
        for col in 0..shape.nx {
            let lon = bbox.lon_at(col as f64 / (shape.nx - 1) as f64);
            points.push((lat, lon));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_contains_endpoints() {
        let bbox = compute_bounding_box(46.4, 10.8, 46.5, 11.0, 1.5).unwrap();
        assert!(bbox.lat_min < 46.4 && bbox.lat_max > 46.5);
        assert!(bbox.lon_min < 10.8 && bbox.lon_max > 11.0);
        assert!(!bbox.crosses_antimeridian());
    }

    #[test]
    fn bounding_box_rejects_coincident_endpoints() {
        let err = compute_bounding_box(46.4, 10.8, 46.4, 10.8, 1.5).unwrap_err();
        assert!(matches!(err, RouteError::Geometry(_)));
    }

    #[test]
    fn bounding_box_spans_antimeridian_via_shorter_arc() {
        // 170E to 170W is 20° across the date line, not 340° the long way.
        let bbox = compute_bounding_box(0.0, 170.0, 0.0, -170.0, 1.0).unwrap();
        assert!(bbox.crosses_antimeridian(), "bbox: {bbox:?}");
        assert!(bbox.lon_min > 150.0 && bbox.lon_min < 170.0);
        assert!(bbox.lon_max < -150.0 && bbox.lon_max > -170.0);
        // Span stays close to arc + buffer, far below the 340° direct range.
        assert!(bbox.lon_span() < 60.0);
    }

    #[test]
    fn normalize_lon_wraps_into_half_open_range() {
        assert_eq!(normalize_lon(180.0), -180.0);
        assert_eq!(normalize_lon(-180.0), -180.0);
        assert_eq!(normalize_lon(190.0), -170.0);
        assert_eq!(normalize_lon(-190.0), 170.0);
        assert_eq!(normalize_lon(10.0), 10.0);
    }

    #[test]
    fn grid_points_cover_corners_row_major() {
        let bbox = BoundingBox {
            lat_min: 46.0,
            lon_min: 10.0,
            lat_max: 47.0,
            lon_max: 11.0,
        };
        let shape = GridShape::new(4, 3);
        let points = grid_points(&bbox, shape);
        assert_eq!(points.len(), 12);
        // Row 0 is the northern edge, column 0 the western edge.
        assert_eq!(points[0], (47.0, 10.0));
        assert_eq!(points[3], (47.0, 11.0));
        assert_eq!(points[8], (46.0, 10.0));
        assert_eq!(points[11], (46.0, 11.0));
    }

    #[test]
    fn grid_points_step_across_antimeridian() {
        let bbox = BoundingBox {
            lat_min: -1.0,
            lon_min: 179.0,
            lat_max: 1.0,
            lon_max: -179.0,
        };
        let points = grid_points(&bbox, GridShape::new(3, 2));
        assert_eq!(points[0].1, 179.0);
        assert_eq!(points[1].1, -180.0);
        assert_eq!(points[2].1, -179.0);
    }

    #[test]
    fn extent_meters_shrinks_with_latitude() {
        let equator = BoundingBox {
            lat_min: -0.5,
            lon_min: 0.0,
            lat_max: 0.5,
            lon_max: 1.0,
        };
        let north = BoundingBox {
            lat_min: 59.5,
            lon_min: 0.0,
            lat_max: 60.5,
            lon_max: 1.0,
        };
        let (lat_eq, lon_eq) = bbox_extent_meters(&equator);
        let (lat_no, lon_no) = bbox_extent_meters(&north);
        assert!((lat_eq - lat_no).abs() < 1e-6);
        // cos(60°) = 0.5: a degree of longitude is half as wide.
        assert!((lon_no / lon_eq - 0.5).abs() < 0.01);
    }
}
