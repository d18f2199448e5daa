//! Async client for the Mapillary v4 API.
//!
//! The crate exposes one entry point, [`MapillaryClient`], with per-resource
//! façades for images, sequences, detections, map features, organizations and
//! vector tiles. Filters accumulate on a builder and are validated locally;
//! nothing touches the network until the terminal `get*` call.
//!
//! Transient failures (timeouts, connection errors, 5xx, rate limiting) are
//! retried with exponential backoff; authentication and client errors surface
//! immediately through the [`Error`] taxonomy.
//!
//! ```no_run
//! use mapillary::MapillaryClient;
//!
//! # async fn run() -> Result<(), mapillary::Error> {
//! let client = MapillaryClient::new("MLY|token")?;
//!
//! let images = client
//!     .images()
//!     .close_to(13.0006076, 55.6089295)?
//!     .radius(100.0)?
//!     .captured_after("2022-01")?
//!     .limit(25)?
//!     .get()
//!     .await?;
//!
//! for image in &images.data {
//!     println!("{}", image.id);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod decode;
mod endpoints;
mod errors;
mod filter;
mod geo;
mod http;
mod models;

pub use client::{MapillaryClient, MapillaryClientBuilder};
pub use config::{ClientConfig, GRAPH_URL, VECTOR_TILES_URL};
pub use endpoints::{
    DetectionsRequest, ImageType, ImagesRequest, MapFeaturesRequest, OrganizationsRequest,
    SequencesRequest, ThumbSize, TileLayerMetadata, VectorTilesRequest,
};
pub use errors::{Error, ErrorCategory, Result};
pub use filter::FilterSet;
pub use geo::{
    tile_bounds, tiles_for_bbox, validate_bbox, validate_coordinates, TileBounds, TileCoord,
    TileLayer, MAX_TILE_ZOOM,
};
pub use models::{
    Detection, Geometry, Image, MapFeature, Organization, ResultPage, Sequence,
};
