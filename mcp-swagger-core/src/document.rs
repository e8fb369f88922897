//! Permissive view over a discovered Swagger 2.0 / OpenAPI 3.x document.
//!
//! Only the regions the projections read are modelled. Every field is
//! optional, and a field holding the wrong JSON type reads as absent instead
//! of failing the whole document.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecDocument {
    #[serde(default, deserialize_with = "string_or_none")]
    pub openapi: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub swagger: Option<String>,

    /// Path string to path item (method name to operation).
    #[serde(default, deserialize_with = "object_or_none")]
    pub paths: Option<Object>,

    #[serde(default, deserialize_with = "components_or_none")]
    pub components: Option<Components>,

    /// Swagger 2.0 schema definitions.
    #[serde(default, deserialize_with = "object_or_none")]
    pub definitions: Option<Object>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default, deserialize_with = "object_or_none")]
    pub schemas: Option<Object>,
}

impl SpecDocument {
    /// Accepts any JSON object; anything else is not a specification.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Declared spec version, e.g. `3.0.1` or `2.0`.
    pub fn version(&self) -> Option<&str> {
        self.openapi.as_deref().or(self.swagger.as_deref())
    }

    /// Path entries with their method keys, in document order.
    pub fn path_items(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.paths.iter().flatten().map(|(path, item)| {
            let methods = item
                .as_object()
                .map(|ops| ops.keys().map(String::as_str).collect())
                .unwrap_or_default();
            (path.as_str(), methods)
        })
    }

    /// `components.schemas`, falling back to `definitions`.
    pub fn schemas(&self) -> Option<&Object> {
        self.components
            .as_ref()
            .and_then(|c| c.schemas.as_ref())
            .or(self.definitions.as_ref())
    }

    /// `paths[path][method].responses`, when every segment is present.
    ///
    /// The method key is matched exactly first, then case-insensitively.
    pub fn responses(&self, path: &str, method: &str) -> Option<&Object> {
        let item = self.paths.as_ref()?.get(path)?.as_object()?;
        let operation = item.get(method).or_else(|| {
            item.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(method))
                .map(|(_, op)| op)
        })?;
        operation.get("responses")?.as_object()
    }
}

fn object_or_none<'de, D>(deserializer: D) -> Result<Option<Object>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn components_or_none<'de, D>(deserializer: D) -> Result<Option<Components>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}
