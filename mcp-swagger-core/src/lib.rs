//! Swagger/OpenAPI explorer core library.
//!
//! Opens an API documentation page in a headless browser, locates the spec
//! it loads, and answers questions about it. The same [`Explorer`] backs the
//! HTTP API ([`api::create_router`]) and the MCP tools ([`build_server`]).

pub mod api;
pub mod browser;
pub mod discovery;
pub mod document;
pub mod error;
pub mod explorer;
pub mod format;
pub mod projection;
pub mod tools;

pub use error::{Error, Result};
pub use explorer::Explorer;

use pmcp::types::{ServerCapabilities, ToolCapabilities};
use pmcp::Server;
use std::sync::Arc;

/// Build a fully-configured MCP server exposing the explorer tools.
pub fn build_server(explorer: Arc<Explorer>) -> pmcp::Result<Server> {
    let builder = Server::builder()
        .name("swagger-explorer")
        .version(env!("CARGO_PKG_VERSION"))
        .capabilities(ServerCapabilities {
            tools: Some(ToolCapabilities {
                list_changed: Some(true),
            }),
            ..Default::default()
        });

    let builder = tools::register_tools(builder, explorer);

    builder.build()
}
