//! Error type shared by discovery, the HTTP API and the MCP tools.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Neither the network nor the page state yielded a specification.
    #[error("Could not find Swagger/OpenAPI specification")]
    NotFound,

    /// Navigation, browser or parsing failure.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl Error {
    pub fn upstream(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Upstream(format!("{}: {}", context, err))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound | Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(format!("Validation failed: {}", errors))
    }
}

impl From<Error> for pmcp::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => pmcp::Error::validation(message),
            other => pmcp::Error::internal(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
