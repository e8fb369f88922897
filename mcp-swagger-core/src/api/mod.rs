//! HTTP API: route table, shared state and request helpers.

pub mod auth;
pub mod explore;
pub mod health;
pub mod response_schemas;

use crate::error::{Error, Result};
use crate::explorer::Explorer;
use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const HEALTH_PATH: &str = "/health";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub explorer: Arc<Explorer>,
    /// Bearer token required on every route but the health check.
    pub auth_token: Option<Arc<str>>,
}

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Prefix for the `/api/...` routes.
    pub base_path: String,
    pub auth_token: Option<String>,
}

/// Create the API router with all routes.
pub fn create_router(explorer: Arc<Explorer>, config: ApiConfig) -> Router {
    let state = AppState {
        explorer,
        auth_token: config
            .auth_token
            .filter(|token| !token.is_empty())
            .map(Arc::from),
    };

    let api = Router::new()
        .route("/api/explore", post(explore::explore))
        .route(
            "/api/response-schemas",
            post(response_schemas::response_schemas),
        );

    let base_path = normalize_base_path(&config.base_path);
    let router = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&base_path, api)
    };

    // The fallback sits under the auth layer so unknown paths are gated too.
    router
        .route(HEALTH_PATH, get(health::health_check))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// `"v1/"` and `"/v1"` both become `"/v1"`; blank becomes `""`.
pub fn normalize_base_path(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Treats absent and empty strings alike.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

fn rejection(err: axum::extract::rejection::JsonRejection) -> Error {
    Error::Validation(err.body_text())
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| Error::upstream("Failed to serialize result", e))
}
