//! Pure projections over a [`SpecDocument`].
//!
//! Nothing here fails: absent or mistyped regions of the document degrade to
//! empty results.

use crate::document::SpecDocument;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to include in an explore result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExploreOptions {
    /// Include the path/method inventory
    #[serde(default)]
    #[schemars(description = "Include the list of paths with their methods")]
    pub paths: bool,

    /// Include the schema name inventory
    #[serde(default)]
    #[schemars(description = "Include the list of schema names")]
    pub schemas: bool,

    /// Restrict the path inventory to paths offering one of these methods
    #[serde(default)]
    #[schemars(
        description = "Only list paths that offer at least one of these HTTP methods (e.g. [\"get\", \"post\"])"
    )]
    pub method_filter: Option<Vec<String>>,
}

impl ExploreOptions {
    fn accepts(&self, methods: &[&str]) -> bool {
        match self.method_filter.as_deref() {
            None | Some([]) => true,
            Some(filter) => methods
                .iter()
                .any(|method| filter.iter().any(|f| f.eq_ignore_ascii_case(method))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<PathEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEntry {
    pub path: String,
    pub methods: Vec<String>,
}

/// One status code of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEntry {
    pub code: String,
    pub description: String,
    pub formats: Vec<ContentFormat>,
}

/// One content type a response can be served as.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFormat {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Value>,
}

/// Build the path and/or schema inventory requested by `options`.
pub fn project(doc: &SpecDocument, options: &ExploreOptions) -> Projection {
    let paths = options.paths.then(|| {
        doc.path_items()
            .filter(|(_, methods)| options.accepts(methods))
            .map(|(path, methods)| PathEntry {
                path: path.to_string(),
                methods: methods.into_iter().map(str::to_string).collect(),
            })
            .collect()
    });

    let schemas = options.schemas.then(|| {
        doc.schemas()
            .map(|schemas| schemas.keys().cloned().collect())
            .unwrap_or_default()
    });

    Projection { paths, schemas }
}

/// Normalise the responses of one operation; unknown operations yield `[]`.
pub fn extract_responses(doc: &SpecDocument, path: &str, method: &str) -> Vec<ResponseEntry> {
    let Some(responses) = doc.responses(path, method) else {
        return Vec::new();
    };

    responses
        .iter()
        .map(|(code, response)| ResponseEntry {
            code: code.clone(),
            description: response
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            formats: response
                .get("content")
                .and_then(Value::as_object)
                .map(|content| {
                    content
                        .iter()
                        .map(|(content_type, media)| ContentFormat {
                            content_type: content_type.clone(),
                            schema: media.get("schema").cloned(),
                            example: media.get("example").cloned(),
                            encoding: media.get("encoding").cloned(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}
