//! Object detection search and retrieval.
//!
//! Detections are served from the map features resource; the filter set below
//! narrows them to the detection-specific vocabulary.

use serde_json::Value;

use crate::client::MapillaryClient;
use crate::decode;
use crate::errors::{Error, Result};
use crate::filter::FilterSet;
use crate::geo;
use crate::models::{Detection, ResultPage};

use super::{collect_fields, params_with_fields, require_id};

/// Fluent query builder for object detections.
#[derive(Debug, Clone)]
pub struct DetectionsRequest<'a> {
    client: &'a MapillaryClient,
    filters: FilterSet,
    fields: Vec<String>,
}

impl<'a> DetectionsRequest<'a> {
    pub(crate) fn new(client: &'a MapillaryClient) -> Self {
        Self { client, filters: FilterSet::new(), fields: Vec::new() }
    }

    /// Filter detections close to a point.
    pub fn close_to(mut self, longitude: f64, latitude: f64) -> Result<Self> {
        geo::validate_coordinates(latitude, longitude)?;
        self.filters.set("longitude", longitude.to_string());
        self.filters.set("latitude", latitude.to_string());
        Ok(self)
    }

    /// Restrict a `close_to` search to a radius in meters.
    pub fn radius(mut self, radius: f64) -> Result<Self> {
        geo::validate_radius(radius)?;
        self.filters.set("radius", radius.to_string());
        Ok(self)
    }

    /// Filter detections within a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        geo::validate_bbox(west, south, east, north)?;
        self.filters.set("bbox", format!("{west},{south},{east},{north}"));
        Ok(self)
    }

    pub fn by_image(mut self, image_id: &str) -> Result<Self> {
        require_id("image_id", image_id)?;
        self.filters.set("image_id", image_id);
        Ok(self)
    }

    pub fn by_sequence(mut self, sequence_id: &str) -> Result<Self> {
        require_id("sequence_id", sequence_id)?;
        self.filters.set("sequence_id", sequence_id);
        Ok(self)
    }

    pub fn by_organization(mut self, organization_id: &str) -> Result<Self> {
        require_id("organization_id", organization_id)?;
        self.filters.set("organization_id", organization_id);
        Ok(self)
    }

    pub fn by_creator(mut self, creator_id: &str) -> Result<Self> {
        require_id("creator_id", creator_id)?;
        self.filters.set("creator_id", creator_id);
        Ok(self)
    }

    /// Filter by detection category, e.g. `trafficsigns` or `points`.
    pub fn object_type(mut self, object_type: &str) -> Result<Self> {
        require_id("object_type", object_type)?;
        self.filters.set("object_type", object_type);
        Ok(self)
    }

    /// Filter by a concrete object value, e.g. `object--traffic-light`.
    pub fn object_value(mut self, value: &str) -> Result<Self> {
        require_id("object_value", value)?;
        self.filters.set("object_value", value);
        Ok(self)
    }

    /// Shorthand for traffic sign detections.
    pub fn traffic_signs(mut self) -> Self {
        self.filters.set("object_type", "trafficsigns");
        self
    }

    /// Shorthand for traffic light detections.
    pub fn traffic_lights(mut self) -> Self {
        self.filters.set("object_value", "object--traffic-light");
        self
    }

    /// Shorthand for person detections.
    pub fn persons(mut self) -> Self {
        self.filters.set("object_value", "object--person");
        self
    }

    /// Shorthand for vehicle detections.
    pub fn vehicles(mut self) -> Self {
        self.filters.set("object_value", "object--vehicle");
        self
    }

    /// Keep only detections with at least this confidence.
    pub fn min_confidence(mut self, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::validation("min_confidence", "must be within 0.0..=1.0"));
        }
        self.filters.set("min_confidence", confidence.to_string());
        Ok(self)
    }

    /// Filter by detection creation date range; `end_date` is optional.
    pub fn created_between(mut self, start_date: &str, end_date: Option<&str>) -> Result<Self> {
        geo::validate_date_string(start_date)?;
        self.filters.set("min_created_at", start_date);
        if let Some(end) = end_date {
            geo::validate_date_string(end)?;
            self.filters.set("max_created_at", end);
        }
        Ok(self)
    }

    /// Filter by when the detected object was first seen.
    pub fn first_seen_between(mut self, start_date: &str, end_date: Option<&str>) -> Result<Self> {
        geo::validate_date_string(start_date)?;
        self.filters.set("min_first_seen_at", start_date);
        if let Some(end) = end_date {
            geo::validate_date_string(end)?;
            self.filters.set("max_first_seen_at", end);
        }
        Ok(self)
    }

    /// Filter by when the detected object was last seen.
    pub fn last_seen_between(mut self, start_date: &str, end_date: Option<&str>) -> Result<Self> {
        geo::validate_date_string(start_date)?;
        self.filters.set("min_last_seen_at", start_date);
        if let Some(end) = end_date {
            geo::validate_date_string(end)?;
            self.filters.set("max_last_seen_at", end);
        }
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
    pub async fn get(&self) -> Result<ResultPage<Detection>> {
        let params = params_with_fields(&self.filters, &self.fields);
        let body = self.client.get_json("/map_features", &params).await?;
        decode::decode_page(body)
    }

    /// Fetch a single detection by id.
    pub async fn get_by_id(&self, detection_id: &str) -> Result<Detection> {
        require_id("detection_id", detection_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{detection_id}"), &params).await?;
        decode::decode_record(body)
    }

    /// Fetch aggregated detection statistics grouped by the given dimension,
    /// e.g. `object_value`. The accumulated filters scope the aggregation.
    pub async fn get_statistics(&self, group_by: &str) -> Result<Value> {
        require_id("group_by", group_by)?;

        let mut params = params_with_fields(&self.filters, &self.fields);
        params.set("group_by", group_by);
        params.set("statistics", "true");
        self.client.get_json("/map_features/statistics", &params).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::tests::test_client;
    use crate::MapillaryClient;

    #[test]
    fn shorthands_set_object_filters() {
        let client = MapillaryClient::new("test-token").expect("client");
        let request = client.detections().traffic_signs().persons();

        assert_eq!(request.filters.get("object_type"), Some("trafficsigns"));
        assert_eq!(request.filters.get("object_value"), Some("object--person"));
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        let client = MapillaryClient::new("test-token").expect("client");
        assert!(client.detections().min_confidence(1.5).is_err());
        assert!(client.detections().min_confidence(-0.1).is_err());
        assert!(client.detections().min_confidence(0.8).is_ok());
    }

    #[tokio::test]
    async fn get_queries_map_features_with_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/map_features"))
            .and(query_param("object_value", "object--traffic-light"))
            .and(query_param("min_confidence", "0.9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "det-1", "object_value": "object--traffic-light", "confidence": 0.97}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let page = client
            .detections()
            .traffic_lights()
            .min_confidence(0.9)
            .unwrap()
            .get()
            .await
            .expect("page");
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].confidence, Some(0.97));
    }

    #[tokio::test]
    async fn statistics_returns_the_raw_aggregation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/map_features/statistics"))
            .and(query_param("group_by", "object_value"))
            .and(query_param("statistics", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"object--traffic-light": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let stats = client.detections().get_statistics("object_value").await.expect("stats");
        assert_eq!(stats["data"]["object--traffic-light"], 42);
    }
}
