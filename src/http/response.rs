//! Response envelope shaping.
//!
//! Pure functions from a handler payload to the uniform envelope. The
//! envelope middleware decides which branch applies and supplies [`Meta`].
//!
//! ```text
//! success: { data, message?, meta, pagination? }
//! error:   { error, message?, details?, retryAfter?, stack?, meta }
//! ```

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Error text used when a failure body names nothing better.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Keys that may hold the item list of a paginated payload, in priority order.
const PAGINATED_KEYS: [&str; 3] = ["operations", "items", "data"];

/// Error fields copied verbatim when present.
const ERROR_PASSTHROUGH: [&str; 3] = ["details", "retryAfter", "stack"];

/// Metadata embedded in every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub timestamp: String,
    /// Original path plus query string.
    pub path: String,
    pub method: String,
    pub status_code: u16,
    pub request_id: String,
    /// Whole milliseconds since the request entered the pipeline.
    pub processing_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub version: String,
}

impl Meta {
    /// Meta stamped with the current time and no count.
    pub fn now(
        path: impl Into<String>,
        method: impl Into<String>,
        status_code: u16,
        request_id: impl Into<String>,
        processing_time: u64,
        version: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: path.into(),
            method: method.into(),
            status_code,
            request_id: request_id.into(),
            processing_time,
            count: None,
            version: version.into(),
        }
    }
}

/// JSON truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| truthy(v))
}

/// Shape a successful payload.
///
/// Branches, first match wins: paginated list, array, object with a
/// `message`, anything else.
pub fn envelope_success(payload: Value, mut meta: Meta) -> Value {
    let mut out = Map::new();

    match payload {
        Value::Object(mut fields) if is_paginated(&fields) => {
            let data = PAGINATED_KEYS
                .iter()
                .find_map(|key| fields.get(*key).filter(|v| truthy(v)).cloned())
                .unwrap_or_else(|| Value::Array(Vec::new()));
            meta.count = Some(data.as_array().map_or(0, Vec::len));

            out.insert("data".into(), data);
            out.insert("meta".into(), meta_value(&meta));
            out.insert(
                "pagination".into(),
                fields.remove("pagination").unwrap_or(Value::Null),
            );
        }
        Value::Array(items) => {
            meta.count = Some(items.len());
            out.insert("data".into(), Value::Array(items));
            out.insert("meta".into(), meta_value(&meta));
        }
        Value::Object(mut fields) if fields.get("message").is_some_and(truthy) => {
            let message = fields.remove("message").unwrap_or(Value::Null);
            let data = if fields.is_empty() {
                Value::Null
            } else {
                Value::Object(fields)
            };

            out.insert("data".into(), data);
            out.insert("message".into(), message);
            out.insert("meta".into(), meta_value(&meta));
        }
        other => {
            out.insert("data".into(), other);
            out.insert("meta".into(), meta_value(&meta));
        }
    }

    Value::Object(out)
}

fn is_paginated(fields: &Map<String, Value>) -> bool {
    fields.get("pagination").is_some_and(truthy)
        && PAGINATED_KEYS
            .iter()
            .any(|key| fields.get(*key).is_some_and(truthy))
}

/// Shape a failure payload.
///
/// `error` falls back to `message`, then to [`UNKNOWN_ERROR`]. `message` is
/// kept only when both are present and differ.
pub fn envelope_error(payload: &Value, meta: Meta) -> Value {
    let error = truthy_field(payload, "error");
    let message = truthy_field(payload, "message");

    let mut out = Map::new();
    out.insert(
        "error".into(),
        error
            .or(message)
            .cloned()
            .unwrap_or_else(|| Value::String(UNKNOWN_ERROR.into())),
    );

    if let (Some(error), Some(message)) = (error, message) {
        if error != message {
            out.insert("message".into(), message.clone());
        }
    }

    for key in ERROR_PASSTHROUGH {
        if let Some(value) = payload.get(key).filter(|v| !v.is_null()) {
            out.insert(key.into(), value.clone());
        }
    }

    out.insert("meta".into(), meta_value(&meta));
    Value::Object(out)
}

fn meta_value(meta: &Meta) -> Value {
    serde_json::to_value(meta).unwrap_or(Value::Null)
}
