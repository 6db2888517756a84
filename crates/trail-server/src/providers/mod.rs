//! Collaborator clients for elevation and imagery data.

pub mod elevation;
pub mod imagery;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    Upstream(String),
    #[error("response could not be decoded: {0}")]
    Decode(String),
}
