//! Response interpretation: untyped analysis payload → ranked, localized findings.
//!
//! The payload shape is owned by the analysis service, so every field is
//! read defensively. Wrong-shaped fields degrade to a `"0"` count or zero
//! findings instead of failing the whole response.

use serde_json::Value;

use crate::lexicon::{translate_class, translate_location};
use crate::types::{AnalysisResult, Finding};

/// Class label used when an object entry has no `class` field.
const UNNAMED_OBJECT: &str = "объект";

/// Interpret the `analysis` object of an upload response.
pub fn interpret(analysis: &Value) -> AnalysisResult {
    let Some(map) = analysis.as_object() else {
        return AnalysisResult {
            object_count: "0".to_string(),
            findings: Vec::new(),
        };
    };

    let object_count = parse_object_count(map.get("object_count"));

    let mut findings: Vec<Finding> = match map.get("objects") {
        Some(Value::Array(entries)) => entries.iter().filter_map(parse_finding).collect(),
        _ => Vec::new(),
    };
    // stable: equal areas keep response order
    findings.sort_by(|a, b| b.pixel_area.cmp(&a.pixel_area));

    tracing::debug!(
        "Interpreted analysis: count={} findings={}",
        object_count,
        findings.len()
    );

    AnalysisResult {
        object_count,
        findings,
    }
}

/// Number → integer text; finite numeric string → parsed and truncated; any
/// other string verbatim; everything else `"0"`.
pub fn parse_object_count(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => truncate(n.as_f64().unwrap_or(0.0)).to_string(),
        },
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => truncate(f).to_string(),
            _ => s.clone(),
        },
        _ => "0".to_string(),
    }
}

fn parse_finding(entry: &Value) -> Option<Finding> {
    let record = entry.as_object()?;

    let class_name = match record.get("class") {
        None | Some(Value::Null) => UNNAMED_OBJECT.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let location_descriptor = match record.get("grid_positions") {
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| match part {
                Value::String(s) => translate_location(s),
                Value::Null => String::new(),
                other => translate_location(&other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => translate_location(s),
        _ => String::new(),
    };

    let pixel_area = match (dimension(record.get("width")), dimension(record.get("height"))) {
        (Some(w), Some(h)) => w.saturating_mul(h),
        _ => 0,
    };

    Some(Finding {
        localized_name: translate_class(&class_name),
        class_name,
        location_descriptor,
        pixel_area,
    })
}

/// A numeric width/height truncated to whole pixels.
fn dimension(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(truncate)),
        _ => None,
    }
}

/// Truncate toward zero; NaN becomes 0 and infinities saturate.
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}
