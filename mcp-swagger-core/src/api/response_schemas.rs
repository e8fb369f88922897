//! POST {base}/api/response-schemas

use super::{present, rejection, to_json, AppState};
use crate::error::{Error, Result};
use crate::format::{format_output, OutputFormat};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ResponseSchemasRequest {
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
    pub format: Option<String>,
}

pub async fn response_schemas(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResponseSchemasRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(rejection)?;
    let (Some(url), Some(path), Some(method)) = (
        present(&request.url),
        present(&request.path),
        present(&request.method),
    ) else {
        return Err(Error::Validation(
            "URL, path, and method are required".to_string(),
        ));
    };
    request.validate()?;

    let responses = state
        .explorer
        .response_schemas(url, path, method)
        .await
        .inspect_err(|e| {
            tracing::error!(%url, %path, %method, error = %e, "Error getting response schemas")
        })?;

    let data = to_json(responses)?;
    Ok(Json(format_output(
        data,
        OutputFormat::parse(request.format.as_deref()),
    )))
}
