//! Per-request route planning: fetch collaborator data, then run the core.

use crate::providers::elevation::fetch_elevation_grid;
use crate::providers::imagery::fetch_water_image;
use crate::providers::ProviderError;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use trail_core::{
    compute_bounding_box, compute_route, BoundingBox, GridShape, RouteStatus, WaterSpec,
    RASTER_OVERSAMPLE,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("elevation provider: {0}")]
    Elevation(ProviderError),
    #[error("imagery provider: {0}")]
    Imagery(ProviderError),
    #[error(transparent)]
    Core(#[from] trail_core::RouteError),
    #[error("route computation exceeded the request deadline")]
    Timeout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutePlanRequest {
    pub lat_start: f64,
    pub lon_start: f64,
    pub lat_end: f64,
    pub lon_end: f64,
    /// Optional grid overrides, clamped to the configured bounds.
    pub nx: Option<usize>,
    pub ny: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutePlanResponse {
    pub status: RouteStatus,
    pub path: Vec<PathPoint>,
    pub total_time_s: f64,
    pub nodes_finalized: usize,
    pub grid: GridShape,
    pub bbox: BoundingBox,
}

/// Plan one route under the configured request deadline.
pub async fn plan_route(
    state: &AppState,
    request: RoutePlanRequest,
) -> Result<RoutePlanResponse, PipelineError> {
    let deadline = Duration::from_secs(state.config.request_timeout_s);
    match tokio::time::timeout(deadline, plan_route_inner(state, request)).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Timeout),
    }
}

async fn plan_route_inner(
    state: &AppState,
    request: RoutePlanRequest,
) -> Result<RoutePlanResponse, PipelineError> {
    for value in [
        request.lat_start,
        request.lon_start,
        request.lat_end,
        request.lon_end,
    ] {
        if !value.is_finite() {
            return Err(PipelineError::BadRequest(
                "coordinates must be finite".into(),
            ));
        }
    }
    let config = &state.config;
    let shape = GridShape::new(
        request.nx.unwrap_or(config.grid_nx).clamp(4, 500),
        request.ny.unwrap_or(config.grid_ny).clamp(4, 500),
    );

    let bbox = compute_bounding_box(
        request.lat_start,
        request.lon_start,
        request.lat_end,
        request.lon_end,
        config.bbox_buffer,
    )
    .map_err(|err| PipelineError::BadRequest(err.to_string()))?;

    tracing::debug!(
        ?bbox,
        nx = shape.nx,
        ny = shape.ny,
        "planning route, fetching collaborator data"
    );

    // Both fetches are independent read-only inputs; overlap them.
    let samples = config.elevation_samples_per_axis;
    let (elevation, image) = tokio::join!(
        fetch_elevation_grid(&state.http, config, &bbox, samples, samples),
        fetch_water_image(
            &state.http,
            config,
            &bbox,
            RASTER_OVERSAMPLE * shape.nx,
            RASTER_OVERSAMPLE * shape.ny,
        ),
    );
    let elevation = elevation.map_err(PipelineError::Elevation)?;
    let image = image.map_err(PipelineError::Imagery)?;

    let water = WaterSpec {
        rgb: config.water_rgb,
        tolerance: config.water_tolerance,
    };
    let result = compute_route(
        request.lat_start,
        request.lon_start,
        request.lat_end,
        request.lon_end,
        &bbox,
        shape,
        &elevation,
        &image,
        &water,
    )?;

    tracing::info!(
        status = ?result.status,
        path_len = result.path.len(),
        nodes_finalized = result.nodes_finalized,
        "route computed"
    );

    let path = result
        .path
        .iter()
        .map(|&index| index_to_point(&bbox, shape, index))
        .collect();
    Ok(RoutePlanResponse {
        status: result.status,
        path,
        total_time_s: result.total_time_s,
        nodes_finalized: result.nodes_finalized,
        grid: shape,
        bbox,
    })
}

fn index_to_point(bbox: &BoundingBox, shape: GridShape, index: usize) -> PathPoint {
    let (row, col) = shape.row_col(index);
    PathPoint {
        lat: bbox.lat_at(row as f64 / (shape.ny - 1) as f64),
        lon: bbox.lon_at(col as f64 / (shape.nx - 1) as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::providers::elevation::ElevationProviderKind;

    fn test_state() -> AppState {
        let config = Config {
            server_port: 0,
            elevation_provider: ElevationProviderKind::OpenTopoData,
            opentopodata_url: String::new(),
            opentopodata_dataset: String::new(),
            epqs_url: String::new(),
            imagery_url: String::new(),
            imagery_set: String::new(),
            imagery_api_key: String::new(),
            water_rgb: [0, 0, 255],
            water_tolerance: 25_000.0,
            grid_nx: 50,
            grid_ny: 50,
            bbox_buffer: 1.5,
            elevation_samples_per_axis: 12,
            elevation_max_points_per_request: 100,
            request_timeout_s: 60,
            provider_timeout_s: 20,
            cache_ttl_s: 600,
        };
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn non_finite_coordinates_are_rejected_before_any_fetch() {
        let state = test_state();
        let request = RoutePlanRequest {
            lat_start: f64::NAN,
            lon_start: 10.8,
            lat_end: 46.5,
            lon_end: 11.0,
            nx: None,
            ny: None,
        };
        match plan_route(&state, request).await {
            Err(PipelineError::BadRequest(message)) => {
                assert!(message.contains("finite"), "unexpected message: {message}");
            }
            other => panic!("expected a bad-request rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn coincident_endpoints_are_a_bad_request() {
        let state = test_state();
        let request = RoutePlanRequest {
            lat_start: 46.4,
            lon_start: 10.8,
            lat_end: 46.4,
            lon_end: 10.8,
            nx: None,
            ny: None,
        };
        assert!(matches!(
            plan_route(&state, request).await,
            Err(PipelineError::BadRequest(_))
        ));
    }

    #[test]
    fn path_indices_map_back_to_box_corners() {
        let bbox = BoundingBox {
            lat_min: 46.0,
            lon_min: 10.0,
            lat_max: 47.0,
            lon_max: 11.0,
        };
        let shape = GridShape::new(5, 4);
        let nw = index_to_point(&bbox, shape, shape.index(0, 0));
        assert_eq!((nw.lat, nw.lon), (47.0, 10.0));
        let se = index_to_point(&bbox, shape, shape.index(3, 4));
        assert_eq!((se.lat, se.lon), (46.0, 11.0));
    }

    #[test]
    fn route_request_deserializes_from_query_shape() {
        let request: RoutePlanRequest = serde_json::from_str(
            r#"{"lat_start":46.4,"lon_start":10.8,"lat_end":46.5,"lon_end":11.0,"nx":30}"#,
        )
        .unwrap();
        assert_eq!(request.nx, Some(30));
        assert_eq!(request.ny, None);
    }
}
