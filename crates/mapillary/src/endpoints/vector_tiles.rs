//! Vector tile retrieval.
//!
//! Tiles are Mapbox Vector Tile blobs; this module fetches the raw bytes and
//! leaves decoding to the caller. Coordinates follow the Web Mercator tiling
//! scheme with zoom capped at 14.

use crate::client::MapillaryClient;
use crate::errors::Result;
use crate::geo::{self, TileLayer};

/// Static description of one tile layer's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayerMetadata {
    pub description: &'static str,
    pub geometry_type: &'static str,
    pub fields: &'static [&'static str],
}

/// Fluent access to the vector tile endpoints.
#[derive(Debug, Clone)]
pub struct VectorTilesRequest<'a> {
    client: &'a MapillaryClient,
}

impl<'a> VectorTilesRequest<'a> {
    pub(crate) fn new(client: &'a MapillaryClient) -> Self {
        Self { client }
    }

    /// Fetch one tile from the named layer.
    pub async fn get_tile(&self, layer: TileLayer, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        geo::validate_tile_coords(z, x, y)?;
        let path = format!("/{}/{z}/{x}/{y}", layer.as_str());
        self.client.get_tile_bytes(&self.client.config().tiles_url, &path).await
    }

    /// Fetch an image layer tile.
    pub async fn get_image_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::Image, z, x, y).await
    }

    /// Fetch a sequence layer tile.
    pub async fn get_sequence_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::Sequence, z, x, y).await
    }

    /// Fetch an overview layer tile.
    pub async fn get_overview_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::Overview, z, x, y).await
    }

    /// Fetch a traffic sign layer tile.
    pub async fn get_traffic_sign_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::TrafficSign, z, x, y).await
    }

    /// Fetch a map feature layer tile.
    pub async fn get_map_feature_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::MapFeature, z, x, y).await
    }

    /// Fetch a tile from the public coverage tile set.
    pub async fn get_coverage_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        geo::validate_tile_coords(z, x, y)?;
        let base = self.client.config().coverage_tiles_url();
        self.client.get_tile_bytes(&base, &format!("/{z}/{x}/{y}")).await
    }

    /// Fetch a tile from the computed (SfM-adjusted) coverage tile set.
    pub async fn get_computed_coverage_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        geo::validate_tile_coords(z, x, y)?;
        let base = self.client.config().computed_coverage_tiles_url();
        self.client.get_tile_bytes(&base, &format!("/{z}/{x}/{y}")).await
    }

    /// Fetch a tile from the map feature point tile set.
    pub async fn get_map_feature_point_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        geo::validate_tile_coords(z, x, y)?;
        let base = self.client.config().map_feature_point_tiles_url();
        self.client.get_tile_bytes(&base, &format!("/{z}/{x}/{y}")).await
    }

    /// Fetch a tile from the map feature traffic sign tile set.
    pub async fn get_map_feature_traffic_sign_tile(
        &self,
        z: u8,
        x: u32,
        y: u32,
    ) -> Result<Vec<u8>> {
        geo::validate_tile_coords(z, x, y)?;
        let base = self.client.config().map_feature_traffic_sign_tiles_url();
        self.client.get_tile_bytes(&base, &format!("/{z}/{x}/{y}")).await
    }

    /// Describe what a tile layer contains: its geometry type and the
    /// per-feature fields encoded in its tiles.
    pub fn get_tile_metadata(&self, layer: TileLayer) -> TileLayerMetadata {
        match layer {
            TileLayer::Image => TileLayerMetadata {
                description: "Image points",
                geometry_type: "Point",
                fields: &["id", "captured_at", "compass_angle", "sequence_id"],
            },
            TileLayer::Sequence => TileLayerMetadata {
                description: "Image sequences",
                geometry_type: "LineString",
                fields: &["id", "created_at", "captured_at", "creator_id"],
            },
            TileLayer::Overview => TileLayerMetadata {
                description: "Simplified overview data",
                geometry_type: "Mixed",
                fields: &["id", "type"],
            },
            TileLayer::TrafficSign => TileLayerMetadata {
                description: "Traffic sign detections",
                geometry_type: "Point",
                fields: &["id", "object_type", "object_value", "confidence"],
            },
            TileLayer::MapFeature => TileLayerMetadata {
                description: "Map features and detections",
                geometry_type: "Point",
                fields: &["id", "object_type", "object_value", "confidence"],
            },
        }
    }
}
