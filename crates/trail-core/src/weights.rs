//! Elevation interpolation and the directed 8-neighbor travel-time table.

use crate::models::{ElevationGrid, GridShape};
use crate::terrain::LandMask;

/// Compass directions in table order. Deltas are (row, col) with row
/// increasing southward and col increasing eastward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
        }
    }

    fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::SouthEast | Direction::SouthWest | Direction::NorthWest
        )
    }

    fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

/// Per-cell elevation in meters, +inf where the cell is water.
#[derive(Debug, Clone)]
pub struct ElevationField {
    shape: GridShape,
    values: Vec<f64>,
}

impl ElevationField {
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }
}

/// Resample a coarse provider lattice onto the movement grid with a
/// Catmull-Rom bicubic interpolant over a shared [0,1]x[0,1] parameterization,
/// then force +inf wherever the land mask says water.
pub fn interpolate_elevation(
    coarse: &ElevationGrid,
    shape: GridShape,
    mask: &LandMask,
) -> ElevationField {
    assert_eq!(mask.shape(), shape, "land mask and grid shape must agree");
    assert!(coarse.rows >= 1 && coarse.cols >= 1);

    let mut values = vec![0.0; shape.len()];
    for row in 0..shape.ny {
        let u = if shape.ny > 1 {
            row as f64 / (shape.ny - 1) as f64
        } else {
            0.0
        };
        for col in 0..shape.nx {
            let v = if shape.nx > 1 {
                col as f64 / (shape.nx - 1) as f64
            } else {
                0.0
            };
            values[shape.index(row, col)] = sample_bicubic(coarse, u, v);
        }
    }
    for (index, value) in values.iter_mut().enumerate() {
        if !mask.is_land(index) {
            *value = f64::INFINITY;
        }
    }
    ElevationField { shape, values }
}

/// Catmull-Rom cubic through p1..p2 with neighbors p0, p3, at t in [0,1].
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

fn sample_bicubic(grid: &ElevationGrid, u: f64, v: f64) -> f64 {
    if grid.rows == 1 && grid.cols == 1 {
        return grid.values[0];
    }
    let y = u * (grid.rows - 1) as f64;
    let x = v * (grid.cols - 1) as f64;
    let y0 = y.floor().min((grid.rows - 1) as f64) as i64;
    let x0 = x.floor().min((grid.cols - 1) as f64) as i64;
    let fy = y - y0 as f64;
    let fx = x - x0 as f64;

    let value_at = |row: i64, col: i64| -> f64 {
        let row = row.clamp(0, grid.rows as i64 - 1) as usize;
        let col = col.clamp(0, grid.cols as i64 - 1) as usize;
        grid.value_at(row, col)
    };

    let mut row_samples = [0.0; 4];
    for (slot, dy) in (-1i64..=2).enumerate() {
        let row = y0 + dy;
        row_samples[slot] = catmull_rom(
            value_at(row, x0 - 1),
            value_at(row, x0),
            value_at(row, x0 + 1),
            value_at(row, x0 + 2),
            fx,
        );
    }
    catmull_rom(row_samples[0], row_samples[1], row_samples[2], row_samples[3], fy)
}

/// Time in seconds to walk between two cells using Tobler's hiking function.
///
/// Base formula is 6·e^(−3.5·|slope + 0.05|) km/h; slope follows the sign
/// convention slope = (h_from − h_to) / spacing, so ascending and descending
/// the same edge cost differently.
pub fn walking_time(h_from: f64, h_to: f64, spacing: f64) -> f64 {
    if !h_from.is_finite() || !h_to.is_finite() {
        return f64::INFINITY;
    }
    let slope = (h_from - h_to) / spacing;
    let speed_mps = 6.0 * (-3.5 * (slope + 0.05).abs()).exp() / 3.6;
    if speed_mps == 0.0 {
        return f64::INFINITY;
    }
    spacing / speed_mps
}

/// Directed travel times to all 8 neighbors of every cell; +inf marks a
/// missing or unusable edge.
#[derive(Debug, Clone)]
pub struct NeighborTimeTable {
    shape: GridShape,
    times: Vec<f64>,
    dx_m: f64,
    dy_m: f64,
}

impl NeighborTimeTable {
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// East/west cell spacing in meters.
    pub fn dx_m(&self) -> f64 {
        self.dx_m
    }

    /// North/south cell spacing in meters.
    pub fn dy_m(&self) -> f64 {
        self.dy_m
    }

    pub fn time(&self, index: usize, direction: Direction) -> f64 {
        self.times[index * 8 + direction as usize]
    }

    /// The neighboring cell in `direction`, or None at the grid border.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        neighbor_index(self.shape, index, direction)
    }
}

fn neighbor_index(shape: GridShape, index: usize, direction: Direction) -> Option<usize> {
    let (row, col) = shape.row_col(index);
    let (dr, dc) = direction.delta();
    let row = row as i64 + dr;
    let col = col as i64 + dc;
    if row < 0 || col < 0 || row >= shape.ny as i64 || col >= shape.nx as i64 {
        return None;
    }
    Some(shape.index(row as usize, col as usize))
}

/// Build the directed edge-weight table from the masked elevation field.
///
/// `lat_dist_m` / `lon_dist_m` are the bbox extents in meters; cell spacing
/// is dx = lon/nx eastward, dy = lat/ny southward, dxy = hypot on diagonals.
pub fn compute_neighbor_times(
    mask: &LandMask,
    elevation: &ElevationField,
    lat_dist_m: f64,
    lon_dist_m: f64,
) -> NeighborTimeTable {
    let shape = mask.shape();
    assert_eq!(elevation.shape(), shape);
    let dx = lon_dist_m / shape.nx as f64;
    let dy = lat_dist_m / shape.ny as f64;
    let dxy = (dx * dx + dy * dy).sqrt();

    let mut times = vec![f64::INFINITY; shape.len() * 8];
    for index in 0..shape.len() {
        let h_from = elevation.value(index);
        for direction in Direction::ALL {
            let Some(neighbor) = neighbor_index(shape, index, direction) else {
                continue;
            };
            let spacing = if direction.is_diagonal() {
                dxy
            } else if direction.is_vertical() {
                dy
            } else {
                dx
            };
            times[index * 8 + direction as usize] =
                walking_time(h_from, elevation.value(neighbor), spacing);
        }
    }
    NeighborTimeTable {
        shape,
        times,
        dx_m: dx,
        dy_m: dy,
    }
}
