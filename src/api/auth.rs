//! Bearer token authentication middleware

use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sha2::Digest;
use sha2::Sha256;

use super::error::ApiError;
use super::handlers::AppState;
use crate::errors::PolicyQaError;
use crate::errors::Result;

const BEARER_PREFIX: &str = "Bearer ";

/// Reject requests whose bearer token does not match the configured secret.
///
/// Runs before the body is read, so a bad token is a 401 whatever the payload.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers());
    verify_api_key(state.api_key.as_deref(), &token)?;
    Ok(next.run(request).await)
}

/// Header value with a leading `"Bearer "` removed; missing or non-ASCII
/// headers yield an empty token
pub fn extract_bearer_token(headers: &HeaderMap) -> String {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).to_string()
}

/// Compare digests so timing does not leak matching prefix length.
/// An unset secret rejects everything.
pub fn verify_api_key(expected: Option<&str>, provided: &str) -> Result<()> {
    let Some(expected) = expected else {
        return Err(PolicyQaError::AuthError(
            "No API key configured; all requests are rejected".to_string(),
        ));
    };

    if Sha256::digest(expected.as_bytes()) == Sha256::digest(provided.as_bytes()) {
        Ok(())
    } else {
        Err(PolicyQaError::AuthError("Bearer token mismatch".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_strips_bearer_prefix() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc123")), "abc123");
    }

    #[test]
    fn test_extract_without_prefix_is_literal() {
        assert_eq!(extract_bearer_token(&headers("abc123")), "abc123");
        assert_eq!(extract_bearer_token(&headers("bearer abc123")), "bearer abc123");
    }

    #[test]
    fn test_extract_strips_only_leading_prefix() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer Bearer abc")),
            "Bearer abc"
        );
    }

    #[test]
    fn test_extract_missing_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), "");
    }

    #[test]
    fn test_verify_api_key() {
        assert!(verify_api_key(Some("secret"), "secret").is_ok());
        assert!(verify_api_key(Some("secret"), "wrong").unwrap_err().is_auth());
        assert!(verify_api_key(Some("secret"), "").is_err());
        assert!(verify_api_key(Some("secret"), "secret ").is_err());
    }

    #[test]
    fn test_unset_secret_rejects_everything() {
        assert!(verify_api_key(None, "").is_err());
        assert!(verify_api_key(None, "anything").is_err());
    }
}
