//! Core data models shared by the routing pipeline.

use serde::{Deserialize, Serialize};

/// Rectangular latitude/longitude region, buffered around the requested
/// start/end points.
///
/// Longitudes are normalized to [-180, 180). A box that crosses the
/// antimeridian stores `lon_min > lon_max` numerically; [`BoundingBox::lon_span`]
/// accounts for the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Latitude extent in degrees. Always positive for a valid box.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude extent in degrees, measured eastward from `lon_min`,
    /// wrapping across the antimeridian when `lon_min > lon_max`.
    pub fn lon_span(&self) -> f64 {
        (self.lon_max - self.lon_min).rem_euclid(360.0)
    }

    /// Whether the box spans the 180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.lon_min > self.lon_max
    }

    /// Longitude at `frac` of the way east across the box, normalized.
    pub fn lon_at(&self, frac: f64) -> f64 {
        crate::geo::normalize_lon(self.lon_min + frac * self.lon_span())
    }

    /// Latitude at `frac` of the way south from the northern edge.
    pub fn lat_at(&self, frac: f64) -> f64 {
        self.lat_max - frac * self.lat_span()
    }
}

/// Dimensions of the movement lattice.
///
/// `nx` counts columns (longitude, col 0 = west), `ny` counts rows
/// (latitude, row 0 = north). Cells are addressed row-major as
/// `row * nx + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub nx: usize,
    pub ny: usize,
}

impl GridShape {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.ny && col < self.nx);
        row * self.nx + col
    }

    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.nx, index % self.nx)
    }
}

/// Coarse elevation samples as returned by an elevation provider.
///
/// Row-major, row 0 = northern edge, col 0 = western edge, the same
/// orientation as the movement grid, possibly at a lower resolution.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

impl ElevationGrid {
    pub fn value_at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }
}

/// Decoded RGB raster returned by an imagery provider, along with the
/// geographic region the image *actually* covers (which may differ slightly
/// from the requested box).
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Packed RGB triples, row-major, row 0 = northern edge.
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub bbox: BoundingBox,
}

impl RasterImage {
    pub fn rgb_at(&self, row: usize, col: usize) -> [u8; 3] {
        let base = (row * self.width + col) * 3;
        [self.pixels[base], self.pixels[base + 1], self.pixels[base + 2]]
    }
}

/// Reference water color and match tolerance for land/water classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaterSpec {
    pub rgb: [u8; 3],
    /// Squared Euclidean RGB distance below which a pixel counts as water.
    /// The default 25_000 allows an average difference of ~90 per channel.
    pub tolerance: f64,
}

impl Default for WaterSpec {
    fn default() -> Self {
        Self {
            rgb: [0, 0, 255],
            tolerance: 25_000.0,
        }
    }
}

/// Outcome of a route computation.
///
/// All four values are normal, expected results; only malformed inputs
/// surface as [`crate::error::RouteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Ok,
    InvalidStart,
    InvalidEnd,
    NoValidPath,
}

/// Result of a single point-to-point search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    pub status: RouteStatus,
    /// Grid indices from start to end. Empty unless `status` is `Ok`.
    pub path: Vec<usize>,
    /// Total walking time along `path` in seconds. Zero unless `status` is `Ok`.
    pub total_time_s: f64,
    /// Number of cells finalized by the search, for diagnostics.
    pub nodes_finalized: usize,
}

impl RouteResult {
    pub fn failure(status: RouteStatus) -> Self {
        Self {
            status,
            path: Vec::new(),
            total_time_s: 0.0,
            nodes_finalized: 0,
        }
    }
}
