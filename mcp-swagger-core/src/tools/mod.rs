//! MCP tool registration.

pub mod explore;
pub mod get_response_schemas;

use crate::explorer::Explorer;
use crate::format::OutputFormat;
use pmcp::TypedTool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Envelope names accepted by the tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormatName {
    Minimal,
    Detailed,
}

impl From<Option<FormatName>> for OutputFormat {
    fn from(name: Option<FormatName>) -> Self {
        match name {
            Some(FormatName::Minimal) => OutputFormat::Minimal,
            Some(FormatName::Detailed) => OutputFormat::Detailed,
            None => OutputFormat::Raw,
        }
    }
}

/// Register both explorer tools onto the server builder.
pub fn register_tools(
    builder: pmcp::ServerBuilder,
    explorer: Arc<Explorer>,
) -> pmcp::ServerBuilder {
    let e = explorer.clone();
    let builder = builder.tool(
        "explore",
        TypedTool::new("explore", move |input: explore::Input, _extra| {
            let e = e.clone();
            Box::pin(async move { explore::execute(&e, input).await })
        })
        .with_description(
            "Explore a Swagger/OpenAPI specification. Opens the documentation page in a headless browser, locates the spec and lists its paths and/or schema names.",
        )
        .read_only(),
    );

    let e = explorer;
    let builder = builder.tool(
        "get_response_schemas",
        TypedTool::new(
            "get_response_schemas",
            move |input: get_response_schemas::Input, _extra| {
                let e = e.clone();
                Box::pin(async move { get_response_schemas::execute(&e, input).await })
            },
        )
        .with_description(
            "Get the response definitions (status code, description, content types with schema and example) for one path and method.",
        )
        .read_only(),
    );

    builder
}
