//! Endpoint validation and Dijkstra search over the weighted grid.

use crate::error::RouteError;
use crate::geo;
use crate::models::{
    BoundingBox, ElevationGrid, GridShape, RasterImage, RouteResult, RouteStatus, WaterSpec,
};
use crate::queue::FrontierQueue;
use crate::terrain::{self, LandMask};
use crate::weights::{self, Direction, NeighborTimeTable};

const NO_PARENT: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Unvisited,
    Frontier,
    Finalized,
}

/// Map a coordinate to the nearest grid cell by linear interpolation within
/// the box, clamping to the border for floating-point spill.
fn nearest_cell(lat: f64, lon: f64, bbox: &BoundingBox, shape: GridShape) -> usize {
    let lat_span = bbox.lat_span();
    let row = (bbox.lat_max - lat) / lat_span * (shape.ny - 1) as f64;
    let row = (row.round() as i64).clamp(0, shape.ny as i64 - 1) as usize;

    let lon_span = bbox.lon_span();
    let east_delta = (geo::normalize_lon(lon) - bbox.lon_min).rem_euclid(360.0);
    let col = if east_delta <= lon_span {
        let col = east_delta / lon_span * (shape.nx - 1) as f64;
        (col.round() as i64).clamp(0, shape.nx as i64 - 1) as usize
    } else if east_delta - lon_span < 360.0 - east_delta {
        // Spilled past the eastern edge; the western wrap-around is farther.
        shape.nx - 1
    } else {
        0
    };
    shape.index(row, col)
}

/// Resolve both endpoints to grid cells and reject any that land on water.
///
/// Returns the start/end indices, or the failure status when an endpoint is
/// not traversable. No search work happens on rejection.
pub fn validate_endpoints(
    lat_start: f64,
    lon_start: f64,
    lat_end: f64,
    lon_end: f64,
    bbox: &BoundingBox,
    mask: &LandMask,
) -> Result<(usize, usize), RouteStatus> {
    let shape = mask.shape();
    let start = nearest_cell(lat_start, lon_start, bbox, shape);
    if !mask.is_land(start) {
        return Err(RouteStatus::InvalidStart);
    }
    let end = nearest_cell(lat_end, lon_end, bbox, shape);
    if !mask.is_land(end) {
        return Err(RouteStatus::InvalidEnd);
    }
    Ok((start, end))
}

/// Dijkstra from `start` to `end` over the directed edge-time table.
///
/// Cells move UNVISITED -> FRONTIER -> FINALIZED; finalized times are never
/// revisited, which is sound because every edge weight is non-negative. The
/// parent/key arrays live only for this call.
pub fn run(start: usize, end: usize, times: &NeighborTimeTable) -> RouteResult {
    let shape = times.shape();
    let cells = shape.len();
    let mut parent = vec![NO_PARENT; cells];
    let mut best = vec![f64::INFINITY; cells];
    let mut state = vec![CellState::Unvisited; cells];
    let mut queue = FrontierQueue::new(cells);

    best[start] = 0.0;
    state[start] = CellState::Frontier;
    queue.insert(start, 0.0);

    let mut nodes_finalized = 0;
    let mut reached = false;
    while let Some((current, current_time)) = queue.extract_min() {
        state[current] = CellState::Finalized;
        nodes_finalized += 1;
        if current == end {
            reached = true;
            break;
        }

        for direction in Direction::ALL {
            let edge = times.time(current, direction);
            if !edge.is_finite() {
                continue;
            }
            let Some(neighbor) = times.neighbor(current, direction) else {
                continue;
            };
            let tentative = current_time + edge;
            match state[neighbor] {
                CellState::Unvisited => {
                    best[neighbor] = tentative;
                    parent[neighbor] = current as i64;
                    state[neighbor] = CellState::Frontier;
                    queue.insert(neighbor, tentative);
                }
                CellState::Frontier if tentative < best[neighbor] => {
                    best[neighbor] = tentative;
                    parent[neighbor] = current as i64;
                    queue.decrease_key(neighbor, tentative);
                }
                _ => {}
            }
        }
    }

    if !reached {
        return RouteResult {
            status: RouteStatus::NoValidPath,
            path: Vec::new(),
            total_time_s: 0.0,
            nodes_finalized,
        };
    }

    let mut path = Vec::new();
    let mut cursor = end as i64;
    while cursor != NO_PARENT {
        path.push(cursor as usize);
        cursor = parent[cursor as usize];
    }
    path.reverse();
    debug_assert_eq!(path.first(), Some(&start));

    RouteResult {
        status: RouteStatus::Ok,
        path,
        total_time_s: best[end],
        nodes_finalized,
    }
}

/// Validate endpoints against the land mask, then search.
pub fn compute_path(
    lat_start: f64,
    lon_start: f64,
    lat_end: f64,
    lon_end: f64,
    bbox: &BoundingBox,
    mask: &LandMask,
    times: &NeighborTimeTable,
) -> RouteResult {
    match validate_endpoints(lat_start, lon_start, lat_end, lon_end, bbox, mask) {
        Ok((start, end)) => run(start, end, times),
        Err(status) => RouteResult::failure(status),
    }
}

/// Full core pipeline over already-fetched collaborator data:
/// classification, interpolation, edge weights, then the search.
#[allow(clippy::too_many_arguments)]
pub fn compute_route(
    lat_start: f64,
    lon_start: f64,
    lat_end: f64,
    lon_end: f64,
    bbox: &BoundingBox,
    shape: GridShape,
    coarse_elevation: &ElevationGrid,
    image: &RasterImage,
    water: &WaterSpec,
) -> Result<RouteResult, RouteError> {
    if coarse_elevation.rows == 0
        || coarse_elevation.cols == 0
        || coarse_elevation.values.len() != coarse_elevation.rows * coarse_elevation.cols
    {
        return Err(RouteError::Elevation(format!(
            "elevation grid claims {}x{} but carries {} samples",
            coarse_elevation.rows,
            coarse_elevation.cols,
            coarse_elevation.values.len()
        )));
    }
    let mask = terrain::classify(bbox, shape, image, water)?;
    let elevation = weights::interpolate_elevation(coarse_elevation, shape, &mask);
    let (lat_m, lon_m) = geo::bbox_extent_meters(bbox);
    let times = weights::compute_neighbor_times(&mask, &elevation, lat_m, lon_m);
    Ok(compute_path(
        lat_start, lon_start, lat_end, lon_end, bbox, &mask, &times,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::compute_neighbor_times;
    use crate::weights::interpolate_elevation;

    fn unit_bbox() -> BoundingBox {
        BoundingBox {
            lat_min: 46.0,
            lon_min: 10.0,
            lat_max: 47.0,
            lon_max: 11.0,
        }
    }

    fn flat_table(mask: &LandMask, lat_m: f64, lon_m: f64) -> NeighborTimeTable {
        let coarse = ElevationGrid {
            rows: 2,
            cols: 2,
            values: vec![0.0; 4],
        };
        let field = interpolate_elevation(&coarse, mask.shape(), mask);
        compute_neighbor_times(mask, &field, lat_m, lon_m)
    }

    fn flat_speed_mps() -> f64 {
        6.0 * (-0.175f64).exp() / 3.6
    }

    #[test]
    fn uniform_grid_prefers_diagonal_steps() {
        let shape = GridShape::new(3, 3);
        let mask = LandMask::from_cells(shape, vec![true; 9]);
        // Square cells: dx = dy, so dxy = dx * sqrt(2) < 2 * dx.
        let table = flat_table(&mask, 300.0, 300.0);
        let result = run(shape.index(0, 0), shape.index(2, 2), &table);
        assert_eq!(result.status, RouteStatus::Ok);
        assert_eq!(
            result.path,
            vec![shape.index(0, 0), shape.index(1, 1), shape.index(2, 2)]
        );
        let dxy = 100.0 * 2.0f64.sqrt();
        let expected = 2.0 * dxy / flat_speed_mps();
        assert!((result.total_time_s - expected).abs() < 1e-9);
    }

    #[test]
    fn start_surrounded_by_water_reports_no_valid_path() {
        let shape = GridShape::new(3, 3);
        let mut cells = vec![false; 9];
        cells[shape.index(0, 0)] = true;
        cells[shape.index(2, 2)] = true;
        let mask = LandMask::from_cells(shape, cells);
        let table = flat_table(&mask, 300.0, 300.0);
        let result = run(shape.index(0, 0), shape.index(2, 2), &table);
        assert_eq!(result.status, RouteStatus::NoValidPath);
        assert!(result.path.is_empty());
        assert_eq!(result.nodes_finalized, 1);
    }

    #[test]
    fn water_endpoints_are_rejected_before_any_search() {
        let shape = GridShape::new(3, 3);
        let mut cells = vec![true; 9];
        cells[shape.index(0, 0)] = false;
        let mask = LandMask::from_cells(shape, cells);
        let bbox = unit_bbox();

        // (47.0, 10.0) is the north-west corner cell, which is water.
        let rejected = validate_endpoints(47.0, 10.0, 46.0, 11.0, &bbox, &mask);
        assert_eq!(rejected, Err(RouteStatus::InvalidStart));
        let rejected = validate_endpoints(46.0, 11.0, 47.0, 10.0, &bbox, &mask);
        assert_eq!(rejected, Err(RouteStatus::InvalidEnd));

        let result = compute_path(
            47.0,
            10.0,
            46.0,
            11.0,
            &bbox,
            &mask,
            &flat_table(&mask, 300.0, 300.0),
        );
        assert_eq!(result.status, RouteStatus::InvalidStart);
        assert_eq!(result.nodes_finalized, 0);
    }

    #[test]
    fn nearest_cell_rounds_and_clamps() {
        let bbox = unit_bbox();
        let shape = GridShape::new(3, 3);
        assert_eq!(nearest_cell(47.0, 10.0, &bbox, shape), shape.index(0, 0));
        assert_eq!(nearest_cell(46.0, 11.0, &bbox, shape), shape.index(2, 2));
        assert_eq!(nearest_cell(46.45, 10.55, &bbox, shape), shape.index(1, 1));
        // Just outside the box clamps to the border.
        assert_eq!(nearest_cell(47.3, 9.9, &bbox, shape), shape.index(0, 0));
    }

    #[test]
    fn search_routes_around_a_water_barrier() {
        // A vertical water wall with a gap in the south row forces a detour.
        let shape = GridShape::new(3, 3);
        let mut cells = vec![true; 9];
        cells[shape.index(0, 1)] = false;
        cells[shape.index(1, 1)] = false;
        let mask = LandMask::from_cells(shape, cells);
        let table = flat_table(&mask, 300.0, 300.0);
        let result = run(shape.index(0, 0), shape.index(0, 2), &table);
        assert_eq!(result.status, RouteStatus::Ok);
        assert!(result.path.contains(&shape.index(2, 1)));
        assert_eq!(result.path.first(), Some(&shape.index(0, 0)));
        assert_eq!(result.path.last(), Some(&shape.index(0, 2)));
    }

    #[test]
    fn travel_time_depends_on_direction() {
        // Sloped terrain: walking the same cells in reverse hits the other
        // branch of |slope + 0.05|, so the two directions cannot cost the
        // same. With slope = (h_from - h_to) / spacing the ascending pass
        // (slope -0.1, |.| = 0.05) is the cheaper one.
        let shape = GridShape::new(3, 2);
        let mask = LandMask::from_cells(shape, vec![true; 6]);
        let coarse = ElevationGrid {
            rows: 2,
            cols: 3,
            values: vec![20.0, 10.0, 0.0, 20.0, 10.0, 0.0],
        };
        let field = interpolate_elevation(&coarse, shape, &mask);
        let table = compute_neighbor_times(&mask, &field, 200.0, 300.0);
        let descending = run(shape.index(0, 0), shape.index(0, 2), &table);
        let ascending = run(shape.index(0, 2), shape.index(0, 0), &table);
        assert_eq!(descending.status, RouteStatus::Ok);
        assert_eq!(ascending.status, RouteStatus::Ok);
        assert!(ascending.total_time_s < descending.total_time_s);
    }

    #[test]
    fn compute_route_runs_the_full_pipeline() {
        let bbox = unit_bbox();
        let shape = GridShape::new(4, 4);
        // All-land raster.
        let mut pixels = Vec::new();
        for _ in 0..(20 * 20) {
            pixels.extend_from_slice(&[40, 160, 40]);
        }
        let image = RasterImage {
            pixels,
            width: 20,
            height: 20,
            bbox,
        };
        let coarse = ElevationGrid {
            rows: 3,
            cols: 3,
            values: vec![100.0; 9],
        };
        let result = compute_route(
            46.9,
            10.1,
            46.1,
            10.9,
            &bbox,
            shape,
            &coarse,
            &image,
            &WaterSpec::default(),
        )
        .unwrap();
        assert_eq!(result.status, RouteStatus::Ok);
        assert!(result.total_time_s > 0.0);
        assert_eq!(result.path.first(), Some(&shape.index(0, 0)));
        assert_eq!(result.path.last(), Some(&shape.index(3, 3)));
    }

    #[test]
    fn compute_route_rejects_malformed_elevation() {
        let bbox = unit_bbox();
        let image = RasterImage {
            pixels: vec![0; 12],
            width: 2,
            height: 2,
            bbox,
        };
        let coarse = ElevationGrid {
            rows: 2,
            cols: 2,
            values: vec![1.0; 3],
        };
        let err = compute_route(
            46.9,
            10.1,
            46.1,
            10.9,
            &bbox,
            GridShape::new(2, 2),
            &coarse,
            &image,
            &WaterSpec::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::Elevation(_)));
    }
}
