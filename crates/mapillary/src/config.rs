//! Client configuration.

use std::time::Duration;

use crate::errors::{Error, Result};

/// Default base URL for the graph API.
pub const GRAPH_URL: &str = "https://graph.mapillary.com";

/// Default base URL for the vector tile endpoints.
pub const VECTOR_TILES_URL: &str = "https://tiles.mapillary.com/maps/vtp";

/// Configuration for [`MapillaryClient`](crate::MapillaryClient).
///
/// `api_key` is required; everything else has defaults matching the upstream
/// recommendations. The base URLs are overridable so tests can point the
/// client at a local mock server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API access token, sent as `Authorization: OAuth <key>` on graph
    /// requests and as the `access_token` query parameter on tile requests.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of retries after the initial attempt for transient failures.
    pub max_retries: usize,
    /// Base delay before the first retry.
    pub retry_backoff: Duration,
    /// Multiplier applied per attempt: `retry_backoff * multiplier^attempt`.
    pub backoff_multiplier: f64,
    /// Base URL for graph API requests.
    pub graph_url: String,
    /// Base URL for vector tile requests.
    pub tiles_url: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            graph_url: GRAPH_URL.to_string(),
            tiles_url: VECTOR_TILES_URL.to_string(),
        }
    }

    /// Check the configuration is usable before any request is issued.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Authentication("API key must be a non-empty string".into()));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::validation("backoff_multiplier", "must be at least 1.0"));
        }
        Ok(())
    }

    /// Tile base for the public coverage layer.
    pub(crate) fn coverage_tiles_url(&self) -> String {
        format!("{}/mly1_public/2", self.tiles_url)
    }

    /// Tile base for the computed (SfM-adjusted) coverage layer.
    pub(crate) fn computed_coverage_tiles_url(&self) -> String {
        format!("{}/mly1_computed_public/2", self.tiles_url)
    }

    pub(crate) fn map_feature_point_tiles_url(&self) -> String {
        format!("{}/mly_map_feature_point/2", self.tiles_url)
    }

    pub(crate) fn map_feature_traffic_sign_tiles_url(&self) -> String {
        format!("{}/mly_map_feature_traffic_sign/2", self.tiles_url)
    }
}
