//! Main entry point: the Mapillary API client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::endpoints::{
    DetectionsRequest, ImagesRequest, MapFeaturesRequest, OrganizationsRequest, SequencesRequest,
    VectorTilesRequest,
};
use crate::errors::{Error, Result};
use crate::filter::FilterSet;
use crate::http::HttpClient;

const USER_AGENT: &str = concat!("mapillary-rs/", env!("CARGO_PKG_VERSION"));

/// Client for the Mapillary v4 API.
///
/// Construction validates the API key; everything else is lazy. The client is
/// cheap to clone and holds no mutable state, so clones can be used from
/// concurrent tasks. Dropping the last clone closes the underlying connection
/// pool.
///
/// # Example
///
/// ```no_run
/// use mapillary::MapillaryClient;
///
/// # async fn run() -> Result<(), mapillary::Error> {
/// let client = MapillaryClient::new("MLY|token")?;
/// let page = client
///     .images()
///     .in_bbox(139.75, 35.67, 139.77, 35.69)?
///     .limit(10)?
///     .get()
///     .await?;
/// for image in &page.data {
///     println!("{} captured at {:?}", image.id, image.captured_at);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MapillaryClient {
    http: HttpClient,
    config: ClientConfig,
}

impl MapillaryClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key))
    }

    /// Create a client from an explicit configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_retries(config.max_retries)
            .backoff_base(config.retry_backoff)
            .backoff_multiplier(config.backoff_multiplier)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, config })
    }

    /// Start building a client with fluent configuration.
    pub fn builder() -> MapillaryClientBuilder {
        MapillaryClientBuilder::default()
    }

    /// Access image search and retrieval.
    pub fn images(&self) -> ImagesRequest<'_> {
        ImagesRequest::new(self)
    }

    /// Access sequence search and retrieval.
    pub fn sequences(&self) -> SequencesRequest<'_> {
        SequencesRequest::new(self)
    }

    /// Access object detection search and retrieval.
    pub fn detections(&self) -> DetectionsRequest<'_> {
        DetectionsRequest::new(self)
    }

    /// Access map feature search and retrieval.
    pub fn map_features(&self) -> MapFeaturesRequest<'_> {
        MapFeaturesRequest::new(self)
    }

    /// Access organization lookups.
    pub fn organizations(&self) -> OrganizationsRequest<'_> {
        OrganizationsRequest::new(self)
    }

    /// Access the vector tile endpoints.
    pub fn vector_tiles(&self) -> VectorTilesRequest<'_> {
        VectorTilesRequest::new(self)
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue an authenticated GET against the graph API and parse the JSON
    /// body.
    pub(crate) async fn get_json(&self, path: &str, params: &FilterSet) -> Result<Value> {
        let url = format!("{}{}", self.config.graph_url, path);
        debug!(%url, params = params.len(), "graph API request");

        let mut request = self
            .http
            .request(Method::GET, &url)
            .header("Authorization", format!("OAuth {}", self.config.api_key));
        if !params.is_empty() {
            request = request.query(params.as_pairs());
        }

        let response = self.http.send(request).await?;
        response
            .json()
            .await
            .map_err(|err| Error::Decode(format!("invalid JSON from {url}: {err}")))
    }

    /// Fetch a binary tile body. Tile endpoints authenticate with the
    /// `access_token` query parameter instead of the OAuth header.
    pub(crate) async fn get_tile_bytes(&self, base_url: &str, path: &str) -> Result<Vec<u8>> {
        let url = format!("{base_url}{path}");
        debug!(%url, "tile request");

        let request = self
            .http
            .request(Method::GET, &url)
            .query(&[("access_token", self.config.api_key.as_str())]);

        let response = self.http.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| Error::Network(format!("failed to read tile body: {err}")))?;
        Ok(bytes.to_vec())
    }

    /// Fetch bytes from a pre-signed URL (image thumbnails).
    pub(crate) async fn get_url_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.send(self.http.request(Method::GET, url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| Error::Network(format!("failed to read response body: {err}")))?;
        Ok(bytes.to_vec())
    }
}

/// Builder for [`MapillaryClient`].
#[derive(Debug, Default)]
pub struct MapillaryClientBuilder {
    api_key: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<usize>,
    retry_backoff: Option<Duration>,
    backoff_multiplier: Option<f64>,
    graph_url: Option<String>,
    tiles_url: Option<String>,
}

impl MapillaryClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of retries after the initial attempt for transient failures.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Base delay before the first retry.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = Some(backoff);
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    /// Override the graph API base URL (primarily for tests).
    pub fn graph_url(mut self, url: impl Into<String>) -> Self {
        self.graph_url = Some(url.into());
        self
    }

    /// Override the vector tile base URL (primarily for tests).
    pub fn tiles_url(mut self, url: impl Into<String>) -> Self {
        self.tiles_url = Some(url.into());
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the API key is missing or
    /// empty, or [`Error::Validation`] for unusable retry settings.
    pub fn build(self) -> Result<MapillaryClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::Authentication("API key must be provided".into()))?;

        let mut config = ClientConfig::new(api_key);
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(backoff) = self.retry_backoff {
            config.retry_backoff = backoff;
        }
        if let Some(multiplier) = self.backoff_multiplier {
            config.backoff_multiplier = multiplier;
        }
        if let Some(url) = self.graph_url {
            config.graph_url = url;
        }
        if let Some(url) = self.tiles_url {
            config.tiles_url = url;
        }

        MapillaryClient::with_config(config)
    }
}
