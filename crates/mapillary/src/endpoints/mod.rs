//! Per-resource request façades.
//!
//! Each façade exposes the filter vocabulary the upstream API supports for
//! that resource, accumulates a [`FilterSet`](crate::FilterSet), and executes
//! on its terminal call. Validated filter methods return `Result<Self>` so bad
//! input fails fast at the call site, before any network traffic.

mod detections;
mod images;
mod map_features;
mod organizations;
mod sequences;
mod vector_tiles;

pub use detections::DetectionsRequest;
pub use images::{ImagesRequest, ImageType, ThumbSize};
pub use map_features::MapFeaturesRequest;
pub use organizations::OrganizationsRequest;
pub use sequences::SequencesRequest;
pub use vector_tiles::{TileLayerMetadata, VectorTilesRequest};

use crate::filter::FilterSet;

/// Merge the accumulated filters with the field selection into the final
/// parameter set for one request.
pub(crate) fn params_with_fields(filters: &FilterSet, fields: &[String]) -> FilterSet {
    let mut params = filters.clone();
    if !fields.is_empty() {
        params.set("fields", fields.join(","));
    }
    params
}

/// Normalize a `fields(...)` selection: `all` short-circuits everything else.
pub(crate) fn collect_fields<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<String> = names.into_iter().map(Into::into).collect();
    if fields.iter().any(|f| f == "all") {
        vec!["all".to_string()]
    } else {
        fields
    }
}

/// Validate that an identifier filter is non-empty.
pub(crate) fn require_id(field: &'static str, value: &str) -> crate::errors::Result<()> {
    if value.is_empty() {
        Err(crate::errors::Error::validation(field, "cannot be empty"))
    } else {
        Ok(())
    }
}
