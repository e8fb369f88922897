//! Response definitions for one operation.

use crate::explorer::Explorer;
use crate::format::format_output;
use crate::tools::FormatName;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct Input {
    #[validate(url)]
    #[schemars(description = "URL of the Swagger UI / API documentation page")]
    pub url: String,

    #[validate(length(min = 1))]
    #[schemars(description = "Path as written in the spec, e.g. \"/pets/{id}\"")]
    pub path: String,

    #[validate(length(min = 1))]
    #[schemars(description = "HTTP method, e.g. \"get\"")]
    pub method: String,

    #[serde(default)]
    #[schemars(description = "Output format: \"minimal\" strips empty fields, \"detailed\" adds metadata")]
    pub format: Option<FormatName>,
}

pub async fn execute(
    explorer: &Arc<Explorer>,
    input: Input,
) -> Result<serde_json::Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let responses = explorer
        .response_schemas(&input.url, &input.path, &input.method)
        .await?;

    let data = serde_json::to_value(responses)
        .map_err(|e| Error::internal(format!("Failed to serialize result: {}", e)))?;

    Ok(format_output(data, input.format.into()))
}
