//! Server configuration from environment.

use std::env;

use crate::providers::elevation::ElevationProviderKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Which elevation backend to query.
    pub elevation_provider: ElevationProviderKind,
    pub opentopodata_url: String,
    pub opentopodata_dataset: String,
    pub epqs_url: String,
    pub imagery_url: String,
    pub imagery_set: String,
    pub imagery_api_key: String,
    /// Reference water color for land/water classification.
    pub water_rgb: [u8; 3],
    /// Squared RGB distance below which a pixel is water.
    pub water_tolerance: f64,
    /// Movement grid dimensions (columns x rows).
    pub grid_nx: usize,
    pub grid_ny: usize,
    /// Bounding-box buffer as a multiple of the endpoint distance.
    pub bbox_buffer: f64,
    /// Coarse elevation lattice size per axis; the core interpolates up.
    pub elevation_samples_per_axis: usize,
    /// Batch size for providers that accept multiple locations per request.
    pub elevation_max_points_per_request: usize,
    /// Deadline for one whole route computation, fetches included.
    pub request_timeout_s: u64,
    /// Timeout for a single upstream request.
    pub provider_timeout_s: u64,
    /// Provider response cache TTL.
    pub cache_ttl_s: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("TRAIL_PORT", 3000),
            elevation_provider: env::var("TRAIL_ELEVATION_PROVIDER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ElevationProviderKind::OpenTopoData),
            opentopodata_url: env_or("TRAIL_OPENTOPODATA_URL", "https://api.opentopodata.org"),
            opentopodata_dataset: env_or("TRAIL_OPENTOPODATA_DATASET", "aster30m"),
            epqs_url: env_or("TRAIL_EPQS_URL", "https://epqs.nationalmap.gov/v1/json"),
            imagery_url: env_or(
                "TRAIL_IMAGERY_URL",
                "http://dev.virtualearth.net/REST/v1/Imagery/Map",
            ),
            imagery_set: env_or("TRAIL_IMAGERY_SET", "Aerial"),
            imagery_api_key: env_or("TRAIL_IMAGERY_API_KEY", ""),
            water_rgb: env::var("TRAIL_WATER_RGB")
                .ok()
                .and_then(|s| parse_water_rgb(&s))
                .unwrap_or([0, 0, 255]),
            water_tolerance: parse_env("TRAIL_WATER_TOLERANCE", 25_000.0),
            grid_nx: parse_env("TRAIL_GRID_NX", 50usize).clamp(4, 500),
            grid_ny: parse_env("TRAIL_GRID_NY", 50usize).clamp(4, 500),
            bbox_buffer: parse_env("TRAIL_BBOX_BUFFER", 1.5),
            elevation_samples_per_axis: parse_env("TRAIL_ELEVATION_SAMPLES", 12usize).clamp(2, 100),
            elevation_max_points_per_request: parse_env("TRAIL_ELEVATION_BATCH", 100usize).max(1),
            request_timeout_s: parse_env("TRAIL_REQUEST_TIMEOUT_S", 60u64).max(5),
            provider_timeout_s: parse_env("TRAIL_PROVIDER_TIMEOUT_S", 20u64).max(3),
            cache_ttl_s: parse_env("TRAIL_CACHE_TTL_S", 600u64).max(30),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse "r,g,b" into channel values.
fn parse_water_rgb(raw: &str) -> Option<[u8; 3]> {
    let mut channels = raw.split(',').map(|part| part.trim().parse::<u8>());
    let r = channels.next()?.ok()?;
    let g = channels.next()?.ok()?;
    let b = channels.next()?.ok()?;
    if channels.next().is_some() {
        return None;
    }
    Some([r, g, b])
}
