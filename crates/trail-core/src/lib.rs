pub mod error;
pub mod geo;
pub mod models;
pub mod queue;
pub mod search;
pub mod terrain;
pub mod weights;

pub use error::RouteError;
pub use geo::{bbox_extent_meters, compute_bounding_box, grid_points, normalize_lon};
pub use models::{
    BoundingBox, ElevationGrid, GridShape, RasterImage, RouteResult, RouteStatus, WaterSpec,
};
pub use queue::FrontierQueue;
pub use search::{compute_path, compute_route, validate_endpoints};
pub use terrain::{classify, LandMask, RASTER_OVERSAMPLE};
pub use weights::{
    compute_neighbor_times, interpolate_elevation, walking_time, Direction, ElevationField,
    NeighborTimeTable,
};
