//! Bearer-token gate.

use super::{AppState, HEALTH_PATH};
use crate::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reject requests without `Authorization: Bearer <token>` when a token is set.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    if request.uri().path() == HEALTH_PATH {
        return next.run(request).await;
    }

    match check_bearer(request.headers(), expected) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                error = %e,
                "Rejected unauthenticated request"
            );
            e.into_response()
        }
    }
}

fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<()> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            Error::Unauthorized("Missing or invalid authorization header".to_string())
        })?;

    if token != expected {
        return Err(Error::Unauthorized("Invalid token".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_accepts_exact_token() {
        assert!(check_bearer(&headers("Bearer s3cret"), "s3cret").is_ok());
    }

    #[test]
    fn test_rejects_missing_header() {
        let err = check_bearer(&HeaderMap::new(), "s3cret").unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid authorization header");
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = check_bearer(&headers("Basic czNjcmV0"), "s3cret").unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid authorization header");
    }

    #[test]
    fn test_rejects_wrong_token() {
        let err = check_bearer(&headers("Bearer guess"), "s3cret").unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");

        let err = check_bearer(&headers("Bearer s3cret "), "s3cret").unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }
}
