//! # Authentication Module
//!
//! API key authentication for the event bridge.
//!
//! ## Configuration
//!
//! Authentication is controlled by one environment variable:
//! - `AUTOGRADE_API_KEY`: If set, all requests (except /health) require this key
//!
//! ## Usage
//!
//! Send the key in the Authorization header:
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "AUTOGRADE_API_KEY";

/// Get API key from environment variable.
///
/// # Returns
/// `Some(key)` when `AUTOGRADE_API_KEY` is set and non-empty, `None`
/// otherwise (authentication disabled).
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

/// Compare two keys in constant time.
///
/// # Arguments
/// * `provided` - Key taken from the request
/// * `expected` - Configured key
///
/// # Returns
/// `true` only when both keys have the same length and bytes.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    // Pad both sides to the longer length so ct_eq always walks the same
    // number of bytes; the length check happens after the comparison.
    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

/// API key authentication middleware.
///
/// If `AUTOGRADE_API_KEY` is set:
/// - `/health` is always allowed (load balancer probes)
/// - every other route needs `Authorization: Bearer <key>` or the raw key
///
/// If it is not set, all requests pass.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    // No key configured
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };

    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(header_value) = auth_header else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    // Accept "Bearer <key>" and a bare "<key>"
    let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
    if keys_match(provided.as_bytes(), expected.as_bytes()) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_api_key",
            "Authentication failed: invalid API key"
        );
        Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_exactly() {
        assert!(keys_match(b"secret", b"secret"));
        assert!(!keys_match(b"secret", b"secreT"));
        assert!(!keys_match(b"secret", b"secret2"));
        assert!(!keys_match(b"", b"secret"));
    }
}
