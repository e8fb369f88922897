//! POST {base}/api/explore

use super::{present, rejection, to_json, AppState};
use crate::error::{Error, Result};
use crate::format::{format_output, OutputFormat};
use crate::projection::ExploreOptions;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ExploreRequest {
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    pub options: Option<ExploreOptions>,
    pub format: Option<String>,
}

pub async fn explore(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExploreRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(rejection)?;
    let url = present(&request.url)
        .ok_or_else(|| Error::Validation("URL is required".to_string()))?;
    request.validate()?;

    let options = request.options.unwrap_or_default();
    let projection = state
        .explorer
        .explore(url, &options)
        .await
        .inspect_err(|e| tracing::error!(%url, error = %e, "Error exploring Swagger"))?;

    let data = to_json(projection)?;
    Ok(Json(format_output(
        data,
        OutputFormat::parse(request.format.as_deref()),
    )))
}
