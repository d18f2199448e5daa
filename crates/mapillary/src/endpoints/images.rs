//! Image search and retrieval.

use crate::client::MapillaryClient;
use crate::decode;
use crate::errors::{Error, Result};
use crate::filter::FilterSet;
use crate::geo;
use crate::models::{Detection, Image, ResultPage};

use super::{collect_fields, params_with_fields, require_id};

/// Image capture type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Flat,
    Pano,
    Both,
    All,
}

impl ImageType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Pano => "pano",
            Self::Both => "both",
            Self::All => "all",
        }
    }
}

/// Thumbnail sizes available for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbSize {
    Thumb256,
    Thumb1024,
    Thumb2048,
    Original,
}

impl ThumbSize {
    /// The response field carrying the download URL for this size.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Thumb256 => "thumb_256_url",
            Self::Thumb1024 => "thumb_1024_url",
            Self::Thumb2048 => "thumb_2048_url",
            Self::Original => "thumb_original_url",
        }
    }
}

/// Fluent query builder for the `/images` resource.
#[derive(Debug, Clone)]
pub struct ImagesRequest<'a> {
    client: &'a MapillaryClient,
    filters: FilterSet,
    fields: Vec<String>,
}

impl<'a> ImagesRequest<'a> {
    pub(crate) fn new(client: &'a MapillaryClient) -> Self {
        Self { client, filters: FilterSet::new(), fields: Vec::new() }
    }

    /// Filter images close to a point, optionally within `radius` meters.
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

    /// Filter images within a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        geo::validate_bbox(west, south, east, north)?;
        self.filters.set("bbox", format!("{west},{south},{east},{north}"));
        Ok(self)
    }

    /// Filter images taken looking toward a target location.
    pub fn lookat(mut self, longitude: f64, latitude: f64) -> Result<Self> {
        geo::validate_coordinates(latitude, longitude)?;
        self.filters.set("lookat", format!("{longitude},{latitude}"));
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

    pub fn by_creator_username(self, username: &str) -> Result<Self> {
        require_id("username", username)?;
        self.by_usernames(&[username])
    }

    /// Filter images by one or more creator usernames.
    pub fn by_usernames(mut self, usernames: &[&str]) -> Result<Self> {
        if usernames.is_empty() {
            return Err(Error::validation("usernames", "at least one username must be provided"));
        }
        self.filters.set("usernames", usernames.join(","));
        Ok(self)
    }

    /// Filter images by one or more creator user keys.
    pub fn by_userkeys(mut self, userkeys: &[&str]) -> Result<Self> {
        if userkeys.is_empty() {
            return Err(Error::validation("userkeys", "at least one user key must be provided"));
        }
        self.filters.set("userkeys", userkeys.join(","));
        Ok(self)
    }

    pub fn by_image_keys(mut self, image_keys: &[&str]) -> Result<Self> {
        if image_keys.is_empty() {
            return Err(Error::validation("image_keys", "at least one image key must be provided"));
        }
        self.filters.set("image_keys", image_keys.join(","));
        Ok(self)
    }

    pub fn by_sequence_keys(mut self, sequence_keys: &[&str]) -> Result<Self> {
        if sequence_keys.is_empty() {
            return Err(Error::validation(
                "sequence_keys",
                "at least one sequence key must be provided",
            ));
        }
        self.filters.set("sequence_keys", sequence_keys.join(","));
        Ok(self)
    }

    pub fn by_organization_keys(mut self, organization_keys: &[&str]) -> Result<Self> {
        if organization_keys.is_empty() {
            return Err(Error::validation(
                "organization_keys",
                "at least one organization key must be provided",
            ));
        }
        self.filters.set("organization_keys", organization_keys.join(","));
        Ok(self)
    }

    /// Filter images by privacy status.
    pub fn private_images(mut self, private: bool) -> Self {
        self.filters.set("private", if private { "true" } else { "false" });
        self
    }

    /// Filter only public images.
    pub fn public_images(self) -> Self {
        self.private_images(false)
    }

    /// Number of images per page, between 1 and 1000.
    pub fn per_page(mut self, count: u32) -> Result<Self> {
        if count == 0 || count > 1000 {
            return Err(Error::validation("per_page", "must be between 1 and 1000"));
        }
        self.filters.set("per_page", count.to_string());
        Ok(self)
    }

    /// Filter images captured since the given timestamp.
    pub fn start_time(mut self, timestamp: &str) -> Result<Self> {
        geo::validate_date_string(timestamp)?;
        self.filters.set("start_time", timestamp);
        Ok(self)
    }

    /// Filter images captured before the given timestamp.
    pub fn end_time(mut self, timestamp: &str) -> Result<Self> {
        geo::validate_date_string(timestamp)?;
        self.filters.set("end_time", timestamp);
        Ok(self)
    }

    /// Filter images by capture date range; `end_date` is optional.
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

    pub fn image_type(mut self, image_type: ImageType) -> Self {
        self.filters.set("image_type", image_type.as_str());
        self
    }

    pub fn panoramic_only(self) -> Self {
        self.image_type(ImageType::Pano)
    }

    pub fn flat_only(self) -> Self {
        self.image_type(ImageType::Flat)
    }

    /// Filter images by a single compass angle in degrees.
    pub fn compass_angle(mut self, angle: f64) -> Result<Self> {
        geo::validate_compass_angle(angle)?;
        self.filters.set("compass_angle", angle.to_string());
        Ok(self)
    }

    /// Filter images by a compass angle range (wraparound over north allowed).
    pub fn compass_angle_range(mut self, min: f64, max: f64) -> Result<Self> {
        geo::validate_compass_range(min, max)?;
        self.filters.set("compass_angle", format!("{min},{max}"));
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

    /// Keep only images whose detections meet this confidence.
    pub fn min_confidence(mut self, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::validation("min_confidence", "must be within 0.0..=1.0"));
        }
        self.filters.set("min_confidence", confidence.to_string());
        Ok(self)
    }

    /// Select which fields the response should include; `"all"` wins over any
    /// other selection.
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

    /// Execute the query. Re-invoking re-issues the request; nothing is
    /// cached.
    pub async fn get(&self) -> Result<ResultPage<Image>> {
        let params = params_with_fields(&self.filters, &self.fields);
        let body = self.client.get_json("/images", &params).await?;
        decode::decode_page(body)
    }

    /// Fetch a single image by id, honoring any `fields(...)` selection.
    pub async fn get_by_id(&self, image_id: &str) -> Result<Image> {
        require_id("image_id", image_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{image_id}"), &params).await?;
        decode::decode_record(body)
    }

    /// Fetch detections attached to a specific image.
    pub async fn get_detections(&self, image_id: &str) -> Result<ResultPage<Detection>> {
        require_id("image_id", image_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{image_id}/detections"), &params).await?;
        decode::decode_page(body)
    }

    /// Download image bytes at the requested thumbnail size.
    ///
    /// Fetches the image metadata first to resolve the pre-signed thumbnail
    /// URL, then downloads the body.
    pub async fn download_image(&self, image_id: &str, size: ThumbSize) -> Result<Vec<u8>> {
        require_id("image_id", image_id)?;

        let mut params = FilterSet::new();
        params.set("fields", size.field_name());
        let body = self.client.get_json(&format!("/{image_id}"), &params).await?;
        let image: Image = decode::decode_record(body)?;

        let url = match size {
            ThumbSize::Thumb256 => image.thumb_256_url,
            ThumbSize::Thumb1024 => image.thumb_1024_url,
            ThumbSize::Thumb2048 => image.thumb_2048_url,
            ThumbSize::Original => image.thumb_original_url,
        };
        let url = url.ok_or_else(|| {
            Error::NotFound(format!(
                "image {image_id} has no {} available",
                size.field_name()
            ))
        })?;

        self.client.get_url_bytes(&url).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::tests::test_client;
    use crate::MapillaryClient;

    use super::*;

    fn offline_client() -> MapillaryClient {
        MapillaryClient::new("test-token").expect("client")
    }

    #[test]
    fn bbox_and_confidence_produce_canonical_params() {
        let client = offline_client();
        let request = client
            .images()
            .in_bbox(139.75, 35.67, 139.77, 35.69)
            .unwrap()
            .min_confidence(0.8)
            .unwrap()
            .limit(10)
            .unwrap();

        assert_eq!(request.filters.get("bbox"), Some("139.75,35.67,139.77,35.69"));
        assert_eq!(request.filters.get("min_confidence"), Some("0.8"));
        assert_eq!(request.filters.get("limit"), Some("10"));
    }

    #[test]
    fn later_filters_overwrite_earlier_ones() {
        let client = offline_client();
        let request = client.images().limit(10).unwrap().limit(25).unwrap();

        assert_eq!(request.filters.get("limit"), Some("25"));
        assert_eq!(request.filters.len(), 1);
    }

    #[test]
    fn invalid_inputs_fail_fast_without_network() {
        let client = offline_client();
        assert!(client.images().in_bbox(139.77, 35.67, 139.75, 35.69).is_err());
        assert!(client.images().close_to(200.0, 35.0).is_err());
        assert!(client.images().radius(-10.0).is_err());
        assert!(client.images().per_page(0).is_err());
        assert!(client.images().per_page(1001).is_err());
        assert!(client.images().limit(0).is_err());
        assert!(client.images().captured_after("not a date").is_err());
        assert!(client.images().compass_angle(400.0).is_err());
        assert!(client.images().by_usernames(&[]).is_err());
        assert!(client.images().by_userkeys(&[]).is_err());
        assert!(client.images().min_confidence(1.5).is_err());
        assert!(client.images().camera_make("").is_err());
    }

    #[test]
    fn userkeys_join_into_one_param() {
        let client = offline_client();
        let request = client.images().by_userkeys(&["key-a", "key-b"]).unwrap();
        assert_eq!(request.filters.get("userkeys"), Some("key-a,key-b"));
    }

    #[test]
    fn fields_all_overrides_other_selections() {
        let client = offline_client();
        let request = client.images().fields(["id", "all", "captured_at"]);
        assert_eq!(request.fields, vec!["all"]);
    }

    #[test]
    fn shorthand_filters_set_expected_params() {
        let client = offline_client();
        let request = client.images().panoramic_only().public_images();
        assert_eq!(request.filters.get("image_type"), Some("pano"));
        assert_eq!(request.filters.get("private"), Some("false"));
    }

    #[tokio::test]
    async fn get_serializes_filters_into_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .and(query_param("bbox", "139.75,35.67,139.77,35.69"))
            .and(query_param("min_captured_at", "2023-01"))
            .and(query_param("fields", "id,captured_at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [
                    {"properties": {"id": "img-1", "captured_at": 1_687_000_000_000_i64}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let page = client
            .images()
            .in_bbox(139.75, 35.67, 139.77, 35.69)
            .unwrap()
            .captured_after("2023-01")
            .unwrap()
            .fields(["id", "captured_at"])
            .get()
            .await
            .expect("page");

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "img-1");
        assert!(page.data[0].captured_at.is_some());
    }

    #[tokio::test]
    async fn same_builder_can_be_reissued() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let request = client.images().limit(5).unwrap();
        request.get().await.expect("first call");
        request.get().await.expect("second call");
    }

    #[tokio::test]
    async fn get_by_id_hits_the_record_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "img-42",
                "is_pano": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let image = client.images().get_by_id("img-42").await.expect("image");
        assert_eq!(image.id, "img-42");
        assert_eq!(image.is_pano, Some(true));
    }

    #[tokio::test]
    async fn download_image_follows_the_thumb_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img-7"))
            .and(query_param("fields", "thumb_1024_url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "img-7",
                "thumb_1024_url": format!("{}/thumbs/img-7.jpg", server.uri())
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/thumbs/img-7.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff]))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let bytes = client
            .images()
            .download_image("img-7", ThumbSize::Thumb1024)
            .await
            .expect("bytes");
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn download_image_without_thumb_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img-8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "img-8"})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.images().download_image("img-8", ThumbSize::Thumb256).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
