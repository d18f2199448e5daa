//! Map feature (point object) search and retrieval.

use crate::client::MapillaryClient;
use crate::decode;
use crate::errors::{Error, Result};
use crate::filter::FilterSet;
use crate::geo;
use crate::models::{Detection, MapFeature, ResultPage};

use super::{collect_fields, params_with_fields, require_id};

/// Fluent query builder for the `/map_features` resource.
#[derive(Debug, Clone)]
pub struct MapFeaturesRequest<'a> {
    client: &'a MapillaryClient,
    filters: FilterSet,
    fields: Vec<String>,
}

impl<'a> MapFeaturesRequest<'a> {
    pub(crate) fn new(client: &'a MapillaryClient) -> Self {
        Self { client, filters: FilterSet::new(), fields: Vec::new() }
    }

    /// Filter features close to a point. This resource takes the combined
    /// `closeto` parameter rather than separate longitude/latitude params.
    pub fn close_to(mut self, longitude: f64, latitude: f64) -> Result<Self> {
        geo::validate_coordinates(latitude, longitude)?;
        self.filters.set("closeto", format!("{longitude},{latitude}"));
        Ok(self)
    }

    /// Restrict a `close_to` search to a radius in meters.
    pub fn radius(mut self, radius: f64) -> Result<Self> {
        geo::validate_radius(radius)?;
        self.filters.set("radius", radius.to_string());
        Ok(self)
    }

    /// Filter features within a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        geo::validate_bbox(west, south, east, north)?;
        self.filters.set("bbox", format!("{west},{south},{east},{north}"));
        Ok(self)
    }

    /// Filter by feature categories, e.g. `point` or `traffic_sign`.
    pub fn object_types(mut self, types: &[&str]) -> Result<Self> {
        if types.is_empty() {
            return Err(Error::validation("object_types", "cannot be empty"));
        }
        self.filters.set("object_types", types.join(","));
        Ok(self)
    }

    /// Filter by concrete object values, e.g. `object--bench`.
    pub fn object_values(mut self, values: &[&str]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::validation("object_values", "cannot be empty"));
        }
        self.filters.set("object_values", values.join(","));
        Ok(self)
    }

    /// Shorthand for bench features.
    pub fn benches(mut self) -> Self {
        self.filters.set("object_values", "object--bench");
        self
    }

    /// Shorthand for fire hydrant features.
    pub fn fire_hydrants(mut self) -> Self {
        self.filters.set("object_values", "object--fire-hydrant");
        self
    }

    /// Shorthand for trash can features.
    pub fn trash_cans(mut self) -> Self {
        self.filters.set("object_values", "object--trash-can");
        self
    }

    /// Shorthand for mailbox features.
    pub fn mailboxes(mut self) -> Self {
        self.filters.set("object_values", "object--mailbox");
        self
    }

    /// Keep only features observed in the given image.
    pub fn by_image(mut self, image_id: &str) -> Result<Self> {
        require_id("image_id", image_id)?;
        self.filters.set("image_id", image_id);
        Ok(self)
    }

    pub fn first_seen_after(mut self, date: &str) -> Result<Self> {
        geo::validate_date_string(date)?;
        self.filters.set("min_first_seen_at", date);
        Ok(self)
    }

    pub fn first_seen_before(mut self, date: &str) -> Result<Self> {
        geo::validate_date_string(date)?;
        self.filters.set("max_first_seen_at", date);
        Ok(self)
    }

    pub fn last_seen_after(mut self, date: &str) -> Result<Self> {
        geo::validate_date_string(date)?;
        self.filters.set("min_last_seen_at", date);
        Ok(self)
    }

    pub fn last_seen_before(mut self, date: &str) -> Result<Self> {
        geo::validate_date_string(date)?;
        self.filters.set("max_last_seen_at", date);
        Ok(self)
    }

    /// Keep only features with at least this confidence.
    pub fn min_confidence(mut self, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::validation("min_confidence", "must be within 0.0..=1.0"));
        }
        self.filters.set("min_confidence", confidence.to_string());
        Ok(self)
    }

    /// Keep only features with at most this confidence.
    pub fn max_confidence(mut self, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::validation("max_confidence", "must be within 0.0..=1.0"));
        }
        self.filters.set("max_confidence", confidence.to_string());
        Ok(self)
    }

    /// Select which fields the response should include.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = collect_fields(names);
        self
    }

    /// Maximum number of results.
    pub fn limit(mut self, count: u32) -> Result<Self> {
        if count == 0 {
            return Err(Error::validation("limit", "must be positive"));
        }
        self.filters.set("limit", count.to_string());
        Ok(self)
    }

    /// Execute the query.
    pub async fn get(&self) -> Result<ResultPage<MapFeature>> {
        let params = params_with_fields(&self.filters, &self.fields);
        let body = self.client.get_json("/map_features", &params).await?;
        decode::decode_page(body)
    }

    /// Fetch a single map feature by id.
    pub async fn get_by_id(&self, feature_id: &str) -> Result<MapFeature> {
        require_id("feature_id", feature_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{feature_id}"), &params).await?;
        decode::decode_record(body)
    }

    /// Fetch the per-image detections that back a map feature.
    pub async fn get_detections(&self, feature_id: &str) -> Result<ResultPage<Detection>> {
        require_id("feature_id", feature_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{feature_id}/detections"), &params).await?;
        decode::decode_page(body)
    }
}
