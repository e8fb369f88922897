//! Output shaping for API and tool results.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Envelope requested by the caller's `format` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Strip empty leaves, wrap in `{status, data}`.
    Minimal,
    /// Wrap with timestamp and metadata.
    Detailed,
    /// Pass the data through untouched.
    Raw,
}

impl OutputFormat {
    /// Unknown or absent names select [`OutputFormat::Raw`].
    pub fn parse(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("minimal") => OutputFormat::Minimal,
            Some("detailed") => OutputFormat::Detailed,
            _ => OutputFormat::Raw,
        }
    }
}

pub fn format_output(data: Value, format: OutputFormat) -> Value {
    match format {
        OutputFormat::Minimal => json!({
            "status": "success",
            "data": minimize(data),
        }),
        OutputFormat::Detailed => json!({
            "status": "success",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "data": data,
            "metadata": {
                "version": "1.0",
                "format": "detailed",
            },
        }),
        OutputFormat::Raw => data,
    }
}

/// Recursively drop object keys holding `null` or `""`.
pub fn minimize(data: Value) -> Value {
    match data {
        Value::Array(items) => Value::Array(items.into_iter().map(minimize).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, value)| !is_empty_leaf(value))
                .map(|(key, value)| (key, minimize(value)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn is_empty_leaf(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
