//! Sequence search and retrieval.

use crate::client::MapillaryClient;
use crate::decode;
use crate::errors::{Error, Result};
use crate::filter::FilterSet;
use crate::geo;
use crate::models::{Image, ResultPage, Sequence};

use super::{collect_fields, params_with_fields, require_id};

/// Fluent query builder for the `/sequences` resource.
#[derive(Debug, Clone)]
pub struct SequencesRequest<'a> {
    client: &'a MapillaryClient,
    filters: FilterSet,
    fields: Vec<String>,
}

impl<'a> SequencesRequest<'a> {
    pub(crate) fn new(client: &'a MapillaryClient) -> Self {
        Self { client, filters: FilterSet::new(), fields: Vec::new() }
    }

    /// Filter sequences close to a point.
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

    /// Filter sequences within a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        geo::validate_bbox(west, south, east, north)?;
        self.filters.set("bbox", format!("{west},{south},{east},{north}"));
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

    /// Filter sequences by capture date range; `end_date` is optional.
    pub fn captured_between(mut self, start_date: &str, end_date: Option<&str>) -> Result<Self> {
        geo::validate_date_string(start_date)?;
        self.filters.set("min_captured_at", start_date);
        if let Some(end) = end_date {
            geo::validate_date_string(end)?;
            self.filters.set("max_captured_at", end);
        }
        Ok(self)
    }

    pub fn captured_after(self, date: &str) -> Result<Self> {
        self.captured_between(date, None)
    }

    pub fn captured_before(mut self, date: &str) -> Result<Self> {
        geo::validate_date_string(date)?;
        self.filters.set("max_captured_at", date);
        Ok(self)
    }

    /// Filter sequences by creation date range.
    pub fn created_between(mut self, start_date: &str, end_date: Option<&str>) -> Result<Self> {
        geo::validate_date_string(start_date)?;
        self.filters.set("min_created_at", start_date);
        if let Some(end) = end_date {
            geo::validate_date_string(end)?;
            self.filters.set("max_created_at", end);
        }
        Ok(self)
    }

    pub fn camera_make(mut self, make: &str) -> Result<Self> {
        require_id("camera_make", make)?;
        self.filters.set("camera_make", make);
        Ok(self)
    }

    pub fn camera_model(mut self, model: &str) -> Result<Self> {
        require_id("camera_model", model)?;
        self.filters.set("camera_model", model);
        Ok(self)
    }

    /// Filter sequences containing at least `count` images.
    pub fn min_images(mut self, count: u32) -> Result<Self> {
        if count == 0 {
            return Err(Error::validation("min_image_count", "must be positive"));
        }
        self.filters.set("min_image_count", count.to_string());
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
    pub async fn get(&self) -> Result<ResultPage<Sequence>> {
        let params = params_with_fields(&self.filters, &self.fields);
        let body = self.client.get_json("/sequences", &params).await?;
        decode::decode_page(body)
    }

    /// Fetch a single sequence by id.
    pub async fn get_by_id(&self, sequence_id: &str) -> Result<Sequence> {
        require_id("sequence_id", sequence_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{sequence_id}"), &params).await?;
        decode::decode_record(body)
    }

    /// Fetch the images belonging to a sequence.
    pub async fn get_images(
        &self,
        sequence_id: &str,
        limit: Option<u32>,
    ) -> Result<ResultPage<Image>> {
        require_id("sequence_id", sequence_id)?;

        let mut params = params_with_fields(&FilterSet::new(), &self.fields);
        params.set("sequence_id", sequence_id);
        if let Some(limit) = limit {
            params.set("limit", limit.to_string());
        }
        let body = self.client.get_json("/images", &params).await?;
        decode::decode_page(body)
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
    fn date_filters_set_min_and_max_params() {
        let client = MapillaryClient::new("test-token").expect("client");
        let request = client
            .sequences()
            .captured_between("2023-01", Some("2023-06"))
            .unwrap()
            .created_between("2022", None)
            .unwrap();

        assert_eq!(request.filters.get("min_captured_at"), Some("2023-01"));
        assert_eq!(request.filters.get("max_captured_at"), Some("2023-06"));
        assert_eq!(request.filters.get("min_created_at"), Some("2022"));
        assert_eq!(request.filters.get("max_created_at"), None);
    }

    #[test]
    fn rejects_bad_inputs_locally() {
        let client = MapillaryClient::new("test-token").expect("client");
        assert!(client.sequences().min_images(0).is_err());
        assert!(client.sequences().by_creator("").is_err());
        assert!(client.sequences().captured_before("13-2023").is_err());
    }

    #[tokio::test]
    async fn get_images_scopes_by_sequence_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .and(query_param("sequence_id", "seq-1"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [
                    {"properties": {"id": "img-1", "sequence_id": "seq-1"}},
                    {"properties": {"id": "img-2", "sequence_id": "seq-1"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let page = client.sequences().get_images("seq-1", Some(2)).await.expect("page");
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].sequence_id.as_deref(), Some("seq-1"));
    }

    #[tokio::test]
    async fn get_by_id_decodes_a_sequence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/seq-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "seq-9",
                "image_count": 128
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let sequence = client.sequences().get_by_id("seq-9").await.expect("sequence");
        assert_eq!(sequence.id, "seq-9");
        assert_eq!(sequence.image_count, Some(128));
    }
}
