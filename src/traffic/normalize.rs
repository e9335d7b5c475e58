//! Pure conversions from backend payloads to canonical types.
//!
//! Nothing here does I/O. Record normalization and status classification
//! are total; envelope extraction only fails on bodies whose shape is not
//! a list or page at all.

use serde::Deserialize;
use serde_json::Value;

use crate::error::TrafficError;

use super::types::{City, CongestionClass, Page, RawTrafficRecord, Road, TrafficRecord};

/// Map a backend record onto the canonical shape.
///
/// Missing optional fields stay `None`; missing identity fields fall back to
/// zero or empty values.
pub fn normalize_record(raw: RawTrafficRecord) -> TrafficRecord {
    TrafficRecord {
        id: raw.id.unwrap_or_default(),
        road_name: raw.road_name.unwrap_or_default(),
        city: raw.city.unwrap_or_default(),
        evaluation_status: raw.evaluation_status.unwrap_or_default(),
        evaluation_status_desc: raw.evaluation_status_desc,
        description: raw.description,
        request_time: raw.request_time,
        speed: raw.speed,
        congestion_distance: raw.congestion_distance,
        status_text: raw.status_text,
    }
}

/// Display category for an evaluation status. Out-of-range values map to
/// [`CongestionClass::Level0`].
pub fn classify_status(status: i32) -> CongestionClass {
    match status {
        1 => CongestionClass::Level1,
        2 => CongestionClass::Level2,
        3 => CongestionClass::Level3,
        4 => CongestionClass::Level4,
        _ => CongestionClass::Level0,
    }
}

/// Pagination fields of the backend's page envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PageMeta {
    total_elements: Option<u64>,
    total_pages: Option<u32>,
    number: Option<u32>,
    size: Option<u32>,
}

/// Split a body into its items and, for an envelope, the page metadata.
///
/// An object carrying `content` is an envelope; anything else is the
/// content itself. `null` is an empty list.
fn split_envelope(body: Value) -> Result<(Vec<Value>, Option<PageMeta>), TrafficError> {
    match body {
        Value::Null => Ok((Vec::new(), None)),
        Value::Array(items) => Ok((items, None)),
        Value::Object(mut map) if map.contains_key("content") => {
            let content = map.remove("content").unwrap_or(Value::Null);
            let items = match content {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => {
                    return Err(TrafficError::InvalidResponse(format!(
                        "page content is not a list: {}",
                        type_name(&other)
                    )))
                }
            };
            let meta = serde_json::from_value(Value::Object(map)).unwrap_or_default();
            Ok((items, Some(meta)))
        }
        other => Err(TrafficError::InvalidResponse(format!(
            "expected a list or page, got {}",
            type_name(&other)
        ))),
    }
}

/// Decode one record and normalize it.
pub fn record_from_value(value: Value) -> Result<TrafficRecord, TrafficError> {
    let raw: RawTrafficRecord = serde_json::from_value(value)
        .map_err(|e| TrafficError::InvalidResponse(format!("malformed traffic record: {}", e)))?;
    Ok(normalize_record(raw))
}

/// Decode a list of records, accepting an envelope or a bare array.
pub fn records_from_body(body: Value) -> Result<Vec<TrafficRecord>, TrafficError> {
    let (items, _) = split_envelope(body)?;
    items.into_iter().map(record_from_value).collect()
}

/// Decode a page of records. A bare array becomes a single page.
pub fn page_from_body(
    body: Value,
    requested_page: u32,
    requested_size: u32,
) -> Result<Page<TrafficRecord>, TrafficError> {
    let (items, meta) = split_envelope(body)?;
    let content = items
        .into_iter()
        .map(record_from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let meta = meta.unwrap_or_default();
    let total_elements = meta.total_elements.unwrap_or(content.len() as u64);
    let size = meta.size.unwrap_or(requested_size);
    let total_pages = meta.total_pages.unwrap_or_else(|| {
        if size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(size)) as u32
        }
    });

    Ok(Page {
        content,
        total_elements,
        total_pages,
        number: meta.number.unwrap_or(requested_page),
        size,
    })
}

/// Decode the supported city list. Items may be bare names or `{name}`.
pub fn cities_from_body(body: Value) -> Result<Vec<City>, TrafficError> {
    let (items, _) = split_envelope(body)?;
    items
        .into_iter()
        .filter_map(|item| name_of(&item, &["name", "city"]))
        .map(|name| Ok(City { name }))
        .collect()
}

/// Decode the road list for `city`. Items may be bare names or objects
/// carrying `name`/`roadName` and optionally their own `city`.
pub fn roads_from_body(body: Value, city: &str) -> Result<Vec<Road>, TrafficError> {
    let (items, _) = split_envelope(body)?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let name = name_of(&item, &["name", "roadName", "road_name"])?;
            let city = item
                .get("city")
                .and_then(Value::as_str)
                .unwrap_or(city)
                .to_string();
            Some(Road { name, city })
        })
        .collect())
}

fn name_of(item: &Value, keys: &[&str]) -> Option<String> {
    match item {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) => keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
