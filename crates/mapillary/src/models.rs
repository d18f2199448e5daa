//! Typed records for Mapillary API responses.
//!
//! Every non-identifying field is optional: a field absent in the response is
//! `None`, never a default guess. Unknown fields in the payload are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

/// A Mapillary image record.
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: String,
    pub geometry: Option<Geometry>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub camera_type: Option<String>,
    pub camera_parameters: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub captured_at: Option<DateTime<Utc>>,
    pub compass_angle: Option<f64>,
    pub sequence_id: Option<String>,
    pub organization_id: Option<String>,
    pub creator_id: Option<String>,
    pub creator_username: Option<String>,
    pub is_pano: Option<bool>,
    pub altitude: Option<f64>,
    pub thumb_256_url: Option<String>,
    pub thumb_1024_url: Option<String>,
    pub thumb_2048_url: Option<String>,
    pub thumb_original_url: Option<String>,
    pub computed_geometry: Option<Geometry>,
    pub computed_compass_angle: Option<f64>,
    pub computed_altitude: Option<f64>,
    pub computed_rotation: Option<Vec<f64>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub exif_orientation: Option<i32>,
    pub atomic_scale: Option<f64>,
    pub mesh_id: Option<String>,
    pub sfm_cluster_id: Option<String>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A Mapillary capture sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub captured_at: Option<DateTime<Utc>>,
    pub organization_id: Option<String>,
    pub creator_id: Option<String>,
    pub creator_username: Option<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub image_count: Option<u64>,
}

/// A detected object in imagery.
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    pub id: String,
    pub geometry: Option<Geometry>,
    pub image_id: Option<String>,
    pub sequence_id: Option<String>,
    pub organization_id: Option<String>,
    pub creator_id: Option<String>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub first_seen_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_seen_at: Option<DateTime<Utc>>,
    pub object_type: Option<String>,
    pub object_value: Option<String>,
    pub confidence: Option<f64>,
}

/// A map feature derived from detections.
#[derive(Debug, Clone, Deserialize)]
pub struct MapFeature {
    pub id: String,
    pub geometry: Option<Geometry>,
    pub object_type: Option<String>,
    pub object_value: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub first_seen_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// An organization that owns imagery.
#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of decoded results plus pagination metadata.
///
/// Ordering is whatever the upstream API returned.
#[derive(Debug, Clone)]
pub struct ResultPage<T> {
    pub data: Vec<T>,
    pub total_count: usize,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub metadata: serde_json::Value,
}

/// Timestamp coercion for response fields.
///
/// The upstream API is inconsistent here: graph responses carry epoch
/// milliseconds while some endpoints return ISO-ish strings. Unparseable
/// values decode to `None` rather than failing the record.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse_value))
    }

    fn parse_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
        match value {
            serde_json::Value::Number(n) => {
                n.as_i64().and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms))
            }
            serde_json::Value::String(s) => parse_str(s),
            _ => None,
        }
    }

    pub(crate) fn parse_str(s: &str) -> Option<DateTime<Utc>> {
        for format in FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(dt.and_utc());
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}
