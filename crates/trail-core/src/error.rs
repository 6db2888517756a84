//! Error taxonomy for the routing core.
//!
//! Only unusable inputs are errors. Water endpoints and disconnected
//! endpoints are reported through [`crate::models::RouteStatus`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    /// Degenerate geometry, rejected before any grid is built.
    #[error("degenerate bounding box: {0}")]
    Geometry(String),

    /// The elevation collaborator returned data the pipeline cannot use.
    #[error("unusable elevation data: {0}")]
    Elevation(String),

    /// The imagery collaborator returned data the pipeline cannot use.
    #[error("unusable imagery data: {0}")]
    Classification(String),
}
