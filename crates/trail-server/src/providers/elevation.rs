//! Elevation provider clients.
//!
//! Two backends implement the same capability and are selected by
//! configuration: OpenTopoData (batched `locations=` queries) and the USGS
//! EPQS point-query service. Both return a coarse north-row-first lattice
//! covering the bounding box; the core interpolates it onto the movement
//! grid.

use crate::config::Config;
use crate::providers::ProviderError;
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use trail_core::{BoundingBox, ElevationGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationProviderKind {
    OpenTopoData,
    Epqs,
}

impl FromStr for ElevationProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opentopodata" => Ok(ElevationProviderKind::OpenTopoData),
            "epqs" => Ok(ElevationProviderKind::Epqs),
            other => Err(format!("unknown elevation provider '{other}'")),
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    fetched_at: Instant,
    grid: ElevationGrid,
}

fn elevation_cache() -> &'static DashMap<String, CacheEntry> {
    static CACHE: OnceLock<DashMap<String, CacheEntry>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

fn cache_key(bbox: &BoundingBox, rows: usize, cols: usize) -> String {
    format!(
        "elev:{:.5}:{:.5}:{:.5}:{:.5}:{}x{}",
        bbox.lat_min, bbox.lon_min, bbox.lat_max, bbox.lon_max, rows, cols
    )
}

/// Fetch a `rows` x `cols` elevation lattice covering `bbox`, row 0 north.
///
/// Responses are cached per bbox/shape with the configured TTL; on a fetch
/// failure a cache entry up to twice the TTL old is served instead.
pub async fn fetch_elevation_grid(
    client: &Client,
    config: &Config,
    bbox: &BoundingBox,
    rows: usize,
    cols: usize,
) -> Result<ElevationGrid, ProviderError> {
    let key = cache_key(bbox, rows, cols);
    let ttl = Duration::from_secs(config.cache_ttl_s);
    let mut stale: Option<ElevationGrid> = None;
    if let Some(entry) = elevation_cache().get(&key) {
        let age = entry.fetched_at.elapsed();
        if age <= ttl {
            return Ok(entry.grid.clone());
        }
        if age <= ttl.saturating_mul(2) {
            stale = Some(entry.grid.clone());
        }
    }

    let points = lattice_points(bbox, rows, cols);
    let fetched = match config.elevation_provider {
        ElevationProviderKind::OpenTopoData => {
            fetch_opentopodata(client, config, &points).await
        }
        ElevationProviderKind::Epqs => fetch_epqs(client, config, &points).await,
    };
    let values = match fetched {
        Ok(values) => values,
        Err(err) => {
            if let Some(stale) = stale {
                tracing::warn!("elevation fetch failed, serving stale cache: {err}");
                return Ok(stale);
            }
            return Err(err);
        }
    };

    let grid = ElevationGrid { rows, cols, values };
    elevation_cache().insert(
        key,
        CacheEntry {
            fetched_at: Instant::now(),
            grid: grid.clone(),
        },
    );
    Ok(grid)
}

/// Sample locations in grid order: row-major, row 0 = northern edge,
/// corners inclusive.
fn lattice_points(bbox: &BoundingBox, rows: usize, cols: usize) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let lat = bbox.lat_at(row as f64 / (rows - 1).max(1) as f64);
        for col in 0..cols {
            let lon = bbox.lon_at(col as f64 / (cols - 1).max(1) as f64);
            points.push((lat, lon));
        }
    }
    points
}

#[derive(Debug, Deserialize)]
struct OpenTopoDataResponse {
    results: Vec<OpenTopoDataResult>,
}

#[derive(Debug, Deserialize)]
struct OpenTopoDataResult {
    elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenTopoDataHealth {
    status: String,
}

async fn fetch_opentopodata(
    client: &Client,
    config: &Config,
    points: &[(f64, f64)],
) -> Result<Vec<f64>, ProviderError> {
    let mut values = Vec::with_capacity(points.len());
    for chunk in points.chunks(config.elevation_max_points_per_request) {
        let url = opentopodata_url(&config.opentopodata_url, &config.opentopodata_dataset, chunk);
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Upstream(format!(
                "OpenTopoData HTTP {}",
                response.status()
            )));
        }
        let payload: OpenTopoDataResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        if payload.results.len() != chunk.len() {
            return Err(ProviderError::Decode(format!(
                "asked for {} locations, got {} results",
                chunk.len(),
                payload.results.len()
            )));
        }
        for result in payload.results {
            // Ocean cells come back null; the classifier masks them anyway.
            let elevation = result.elevation.unwrap_or(0.0);
            values.push(if elevation.is_finite() { elevation } else { 0.0 });
        }
    }
    Ok(values)
}

fn opentopodata_url(base: &str, dataset: &str, points: &[(f64, f64)]) -> String {
    let locations = points
        .iter()
        .map(|(lat, lon)| format!("{lat:.6},{lon:.6}"))
        .collect::<Vec<_>>()
        .join("|");
    format!("{}/v1/{}?locations={}", base.trim_end_matches('/'), dataset, locations)
}

/// Check the OpenTopoData health endpoint.
pub async fn opentopodata_healthy(client: &Client, config: &Config) -> bool {
    let url = format!("{}/health", config.opentopodata_url.trim_end_matches('/'));
    match client.get(url).send().await {
        Ok(response) => response
            .json::<OpenTopoDataHealth>()
            .await
            .map(|health| health.status == "OK")
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[derive(Debug, Deserialize)]
struct EpqsResponse {
    #[serde(rename = "USGS_Elevation_Point_Query_Service")]
    service: EpqsService,
}

#[derive(Debug, Deserialize)]
struct EpqsService {
    #[serde(rename = "Elevation_Query")]
    query: EpqsQuery,
}

#[derive(Debug, Deserialize)]
struct EpqsQuery {
    #[serde(rename = "Elevation")]
    elevation: f64,
}

async fn fetch_epqs(
    client: &Client,
    config: &Config,
    points: &[(f64, f64)],
) -> Result<Vec<f64>, ProviderError> {
    // EPQS answers one point per request; the coarse lattice keeps this small.
    let mut values = Vec::with_capacity(points.len());
    for (lat, lon) in points {
        let url = epqs_url(&config.epqs_url, *lat, *lon);
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Upstream(format!(
                "EPQS HTTP {}",
                response.status()
            )));
        }
        let payload: EpqsResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        let elevation = payload.service.query.elevation;
        values.push(if elevation.is_finite() { elevation } else { 0.0 });
    }
    Ok(values)
}

fn epqs_url(base: &str, lat: f64, lon: f64) -> String {
    let separator = if base.contains('?') { "&" } else { "?" };
    format!("{base}{separator}x={lon:.6}&y={lat:.6}&units=Meters&output=json")
}
