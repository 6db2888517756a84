//! Static-map imagery client.
//!
//! Fetches an aerial raster covering a bounding box plus the metadata that
//! reports the image's *actual* coverage, which the classifier needs because
//! the upstream snaps requests to its own tile geometry.

use crate::config::Config;
use crate::providers::ProviderError;
use reqwest::Client;
use serde::Deserialize;
use trail_core::{BoundingBox, RasterImage};

/// Build the static-map URL for `bbox` at `width` x `height` pixels.
///
/// The API key is appended only when given; the map-proxy endpoint relies on
/// this to keep the key out of client-visible URLs.
pub fn static_map_url(
    config: &Config,
    bbox: &BoundingBox,
    width: usize,
    height: usize,
    key: Option<&str>,
) -> String {
    let mut url = format!(
        "{}/{}?mapArea={},{},{},{}&mapSize={},{}&format=jpeg",
        config.imagery_url.trim_end_matches('/'),
        config.imagery_set,
        bbox.lat_min,
        bbox.lon_min,
        bbox.lat_max,
        bbox.lon_max,
        width,
        height,
    );
    if let Some(key) = key {
        url.push_str("&key=");
        url.push_str(key);
    }
    url
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(rename = "resourceSets")]
    resource_sets: Vec<ResourceSet>,
}

#[derive(Debug, Deserialize)]
struct ResourceSet {
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    /// [south, west, north, east]
    bbox: Vec<f64>,
}

fn actual_bbox(payload: &MetadataResponse) -> Result<BoundingBox, ProviderError> {
    let resource = payload
        .resource_sets
        .first()
        .and_then(|set| set.resources.first())
        .ok_or_else(|| ProviderError::Decode("metadata carries no resources".into()))?;
    if resource.bbox.len() != 4 {
        return Err(ProviderError::Decode(format!(
            "metadata bbox has {} entries, expected 4",
            resource.bbox.len()
        )));
    }
    Ok(BoundingBox {
        lat_min: resource.bbox[0],
        lon_min: resource.bbox[1],
        lat_max: resource.bbox[2],
        lon_max: resource.bbox[3],
    })
}

/// Fetch and decode the raster used for water classification.
pub async fn fetch_water_image(
    client: &Client,
    config: &Config,
    bbox: &BoundingBox,
    width: usize,
    height: usize,
) -> Result<RasterImage, ProviderError> {
    let key = config.imagery_api_key.as_str();
    let image_url = static_map_url(config, bbox, width, height, Some(key));
    let metadata_url = format!(
        "{}&mapMetadata=1&o=json",
        static_map_url(config, bbox, width, height, Some(key))
    );

    let (image_response, metadata_response) =
        tokio::join!(client.get(image_url).send(), client.get(metadata_url).send());

    let image_response = image_response?;
    if !image_response.status().is_success() {
        return Err(ProviderError::Upstream(format!(
            "imagery HTTP {}",
            image_response.status()
        )));
    }
    let metadata_response = metadata_response?;
    if !metadata_response.status().is_success() {
        return Err(ProviderError::Upstream(format!(
            "imagery metadata HTTP {}",
            metadata_response.status()
        )));
    }

    let bytes = image_response.bytes().await?;
    let metadata: MetadataResponse = metadata_response
        .json()
        .await
        .map_err(|err| ProviderError::Decode(err.to_string()))?;
    let actual = actual_bbox(&metadata)?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|err| ProviderError::Decode(format!("raster decode: {err}")))?
        .to_rgb8();
    let (decoded_width, decoded_height) = decoded.dimensions();
    Ok(RasterImage {
        pixels: decoded.into_raw(),
        width: decoded_width as usize,
        height: decoded_height as usize,
        bbox: actual,
    })
}

/// Fetch raw map bytes for the proxy endpoint, key attached server-side.
pub async fn fetch_map_bytes(
    client: &Client,
    config: &Config,
    bbox: &BoundingBox,
    width: usize,
    height: usize,
) -> Result<Vec<u8>, ProviderError> {
    let url = static_map_url(config, bbox, width, height, Some(&config.imagery_api_key));
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ProviderError::Upstream(format!(
            "imagery HTTP {}",
            response.status()
        )));
    }
    Ok(response.bytes().await?.to_vec())
}
