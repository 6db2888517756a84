//! REST API routes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::pipeline::{plan_route, PipelineError, RoutePlanRequest};
use crate::providers::elevation::{opentopodata_healthy, ElevationProviderKind};
use crate::providers::imagery::fetch_map_bytes;
use crate::providers::ProviderError;
use crate::state::AppState;
use trail_core::BoundingBox;

const MAX_PROXY_DIMENSION: usize = 2048;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/route", get(get_route))
        .route("/v1/providers/health", get(providers_health))
        .route("/v1/map-proxy", get(map_proxy))
}

/// Uniform JSON error body.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Elevation(_) | PipelineError::Imagery(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Core(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!("route request failed: {err}");
        }
        ApiError::new(status, err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        tracing::error!("provider request failed: {err}");
        ApiError::new(StatusCode::BAD_GATEWAY, err.to_string())
    }
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(request): Query<RoutePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = plan_route(&state, request).await?;
    Ok(Json(response))
}

async fn providers_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = match state.config.elevation_provider {
        ElevationProviderKind::OpenTopoData => {
            Some(opentopodata_healthy(&state.http, &state.config).await)
        }
        // EPQS exposes no health endpoint.
        ElevationProviderKind::Epqs => None,
    };
    Json(json!({
        "elevation_provider": format!("{:?}", state.config.elevation_provider),
        "elevation_healthy": healthy,
    }))
}

#[derive(Debug, Deserialize)]
struct MapProxyParams {
    lat_min: f64,
    lon_min: f64,
    lat_max: f64,
    lon_max: f64,
    width: usize,
    height: usize,
}

/// Forward a static-map request with the server-side API key attached, so
/// the key never reaches a browser.
async fn map_proxy(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapProxyParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.lat_min >= params.lat_max {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "lat_min must be below lat_max",
        ));
    }
    if params.width == 0
        || params.height == 0
        || params.width > MAX_PROXY_DIMENSION
        || params.height > MAX_PROXY_DIMENSION
    {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("map size must be within 1..={MAX_PROXY_DIMENSION} pixels per axis"),
        ));
    }
    let bbox = BoundingBox {
        lat_min: params.lat_min,
        lon_min: params.lon_min,
        lat_max: params.lat_max,
        lon_max: params.lon_max,
    };
    let bytes = fetch_map_bytes(
        &state.http,
        &state.config,
        &bbox,
        params.width,
        params.height,
    )
    .await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
