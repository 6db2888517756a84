//! Shared application state.

use crate::config::Config;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_s))
            .build()
            .context("failed to build the upstream HTTP client")?;
        Ok(Self { config, http })
    }
}
