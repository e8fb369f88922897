//! Path and schema inventory of a documented API.

use crate::explorer::Explorer;
use crate::format::format_output;
use crate::projection::ExploreOptions;
use crate::tools::FormatName;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct Input {
    /// URL of the API documentation page
    #[validate(url)]
    #[schemars(description = "URL of the Swagger UI / API documentation page")]
    pub url: String,

    /// What to include in the result
    #[serde(default)]
    #[schemars(description = "Select paths and/or schemas, optionally filtered by HTTP method")]
    pub options: Option<ExploreOptions>,

    /// Output envelope
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

    let options = input.options.unwrap_or_default();
    let projection = explorer.explore(&input.url, &options).await?;

    let data = serde_json::to_value(projection)
        .map_err(|e| Error::internal(format!("Failed to serialize result: {}", e)))?;

    Ok(format_output(data, input.format.into()))
}
