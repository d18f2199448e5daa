//! Response decoding: JSON payloads into typed records.
//!
//! The graph API answers in two shapes: GeoJSON feature collections
//! (`{"type": "FeatureCollection", "features": [...]}` with per-feature
//! `geometry` and `properties`) and flat Graph-API objects (single records or
//! `{"data": [...]}` lists). Both are normalized here before hitting serde.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::models::ResultPage;

/// Decode a list response into a page of typed records.
///
/// A record missing its `id` fails the whole page rather than silently
/// producing partial results.
pub fn decode_page<T: DeserializeOwned>(body: Value) -> Result<ResultPage<T>> {
    let Value::Object(mut map) = body else {
        return Err(Error::Decode("expected a JSON object response".into()));
    };

    let features = match map.remove("features").or_else(|| map.remove("data")) {
        Some(Value::Array(features)) => features,
        Some(other) => {
            return Err(Error::Decode(format!(
                "expected an array of records, got {}",
                type_name(&other)
            )));
        }
        None => Vec::new(),
    };

    let mut data = Vec::with_capacity(features.len());
    for (index, feature) in features.into_iter().enumerate() {
        let record = decode_record(feature)
            .map_err(|err| Error::Decode(format!("record {index}: {err}")))?;
        data.push(record);
    }

    let total_count = map
        .get("total_count")
        .and_then(Value::as_u64)
        .map_or(data.len(), |count| count as usize);
    let has_more = map.get("has_more").and_then(Value::as_bool).unwrap_or(false);
    let next_cursor =
        map.get("next_cursor").and_then(Value::as_str).map(str::to_string);
    let metadata = map.remove("metadata").unwrap_or(Value::Null);

    Ok(ResultPage { data, total_count, has_more, next_cursor, metadata })
}

/// Decode a single record from either a GeoJSON feature or a flat object.
pub fn decode_record<T: DeserializeOwned>(value: Value) -> Result<T> {
    let normalized = flatten_feature(value)?;
    serde_json::from_value(normalized).map_err(|err| Error::Decode(err.to_string()))
}

/// Merge a feature's `properties` with its top-level `geometry` so records
/// deserialize from one flat object. Objects without a `properties` wrapper
/// pass through untouched.
fn flatten_feature(value: Value) -> Result<Value> {
    let Value::Object(mut map) = value else {
        return Err(Error::Decode(format!("expected a JSON object, got {}", type_name(&value))));
    };

    match map.remove("properties") {
        Some(Value::Object(mut properties)) => {
            if let Some(geometry) = map.remove("geometry") {
                properties.entry("geometry").or_insert(geometry);
            }
            Ok(Value::Object(properties))
        }
        Some(other) => {
            Err(Error::Decode(format!("expected properties object, got {}", type_name(&other))))
        }
        None => Ok(Value::Object(map)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Detection, Image};

    #[test]
    fn decodes_geojson_feature_collection() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [139.75, 35.67]},
                    "properties": {"id": "img-1", "is_pano": false}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [139.76, 35.68]},
                    "properties": {"id": "img-2", "compass_angle": 90.0}
                }
            ]
        });

        let page: ResultPage<Image> = decode_page(body).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.data[0].id, "img-1");
        assert_eq!(page.data[0].geometry.as_ref().unwrap().kind, "Point");
        assert_eq!(page.data[1].compass_angle, Some(90.0));
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn decodes_graph_data_list() {
        let body = json!({
            "data": [
                {"id": "d-1", "object_type": "traffic_sign", "confidence": 0.97}
            ],
            "has_more": true,
            "next_cursor": "abc123"
        });

        let page: ResultPage<Detection> = decode_page(body).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("abc123"));
    }

    #[test]
    fn record_without_id_fails_the_whole_page() {
        let body = json!({
            "features": [
                {"properties": {"id": "img-1"}},
                {"properties": {"compass_angle": 1.0}}
            ]
        });

        let result: Result<ResultPage<Image>> = decode_page(body);
        let err = result.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("record 1"), "unexpected error: {message}");
        assert!(message.contains("id"), "unexpected error: {message}");
    }

    #[test]
    fn empty_feature_list_is_an_empty_page() {
        let page: ResultPage<Image> = decode_page(json!({"features": []})).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn non_object_response_fails() {
        let result: Result<ResultPage<Image>> = decode_page(json!([1, 2, 3]));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn flat_record_decodes_without_properties_wrapper() {
        let image: Image = decode_record(json!({"id": "img-9", "width": 4096})).unwrap();
        assert_eq!(image.id, "img-9");
        assert_eq!(image.width, Some(4096));
    }

    #[test]
    fn trusts_upstream_total_count_over_page_length() {
        let body = json!({
            "features": [{"properties": {"id": "img-1"}}],
            "total_count": 4200,
            "has_more": true
        });
        let page: ResultPage<Image> = decode_page(body).unwrap();
        assert_eq!(page.total_count, 4200);
        assert!(page.has_more);
    }
}
