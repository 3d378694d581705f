use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Flat view of an evaluation payload. `None` means "not reported".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub overall_score: Option<f64>,
    pub conservation_status: Option<String>,
    pub legal_status: Option<String>,
    pub legal_status_reason: Option<String>,
    pub bodywork_score: Option<f64>,
    pub paint_score: Option<f64>,
    pub glass_lights_score: Option<f64>,
    pub tires_wheels_score: Option<f64>,
    pub interior_score: Option<f64>,
    pub damages_detected: Vec<String>,
    pub recommendations: Vec<String>,
    pub best_frames: Vec<FrameCitation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameCitation {
    pub filename: Option<String>,
    pub reason: Option<String>,
}

impl NormalizedResult {
    pub fn from_value(raw: Option<&Value>) -> Self {
        let payload = raw.map(unwrap_envelope).map(resolve_raw);
        match payload {
            Some(Value::Object(map)) => Self::from_map(&map),
            _ => Self::default(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            overall_score: number(map, "overall_score"),
            conservation_status: text(map, "conservation_status"),
            legal_status: text(map, "legal_status"),
            legal_status_reason: text(map, "legal_status_reason"),
            bodywork_score: number(map, "bodywork_score"),
            paint_score: number(map, "paint_score"),
            glass_lights_score: number(map, "glass_lights_score"),
            tires_wheels_score: number(map, "tires_wheels_score"),
            interior_score: number(map, "interior_score"),
            damages_detected: text_list(map, "damages_detected"),
            recommendations: text_list(map, "recommendations"),
            best_frames: frame_citations(map),
        }
    }
}

/// Unwraps a payload nested one level down under `result`.
fn unwrap_envelope(raw: &Value) -> &Value {
    match raw.get("result") {
        Some(inner @ Value::Object(_)) => inner,
        _ => raw,
    }
}

/// Overlays a JSON-encoded `raw` string onto the mapping. Overlay keys win and
/// `raw` is dropped. Anything that does not decode to an object leaves the
/// input untouched.
pub fn resolve_raw(value: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let Some(Value::String(encoded)) = map.get("raw") else {
        return value.clone();
    };
    let overlay = match serde_json::from_str::<Value>(encoded) {
        Ok(Value::Object(overlay)) => overlay,
        Ok(other) => {
            debug!("raw field decoded to non-object ({}); ignoring", kind(&other));
            return value.clone();
        }
        Err(err) => {
            debug!("raw field is not JSON: {err}");
            return value.clone();
        }
    };

    let mut merged = map.clone();
    merged.remove("raw");
    for (k, v) in overlay {
        merged.insert(k, v);
    }
    Value::Object(merged)
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}

fn text_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    }
}

fn frame_citations(map: &Map<String, Value>) -> Vec<FrameCitation> {
    let Some(Value::Array(items)) = map.get("best_frames") else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(f) => FrameCitation {
                filename: text(f, "filename").filter(|s| !s.is_empty()),
                reason: text(f, "reason"),
            },
            other => FrameCitation {
                filename: scalar_text(other),
                reason: None,
            },
        })
        .collect()
}
