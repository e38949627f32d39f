//! Double-submit CSRF token checks.
//!
//! The token is issued as a script-readable cookie; state-changing requests
//! must echo it back in a header. A mismatch or a missing side rejects the
//! request before any other work happens.

use axum::http::HeaderMap;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::error::AuthError;
use super::utils::extract_cookie;

pub(super) const CSRF_COOKIE_NAME: &str = "csrfToken";
pub(super) const CSRF_HEADER_NAME: &str = "csrf-token";

const CSRF_TOKEN_BYTES: usize = 32;

pub(super) fn issue_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Requires the cookie and header to carry the same token. Comparison goes
/// through a digest so length differences leak nothing.
pub(super) fn verify_csrf(headers: &HeaderMap) -> Result<(), AuthError> {
    let cookie = extract_cookie(headers, CSRF_COOKIE_NAME).ok_or(AuthError::CsrfRejected)?;

    let header = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::CsrfRejected)?;

    if Sha256::digest(cookie.as_bytes()) == Sha256::digest(header.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::CsrfRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn headers_with(cookie: Option<&str>, header_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = cookie {
            let value = format!("{CSRF_COOKIE_NAME}={token}");
            headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        }
        if let Some(token) = header_token {
            headers.insert(CSRF_HEADER_NAME, HeaderValue::from_str(token).unwrap());
        }
        headers
    }

    #[test]
    fn issued_tokens_are_unique_and_url_safe() {
        let a = issue_csrf_token();
        let b = issue_csrf_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn matching_cookie_and_header_pass() {
        let token = issue_csrf_token();
        assert!(verify_csrf(&headers_with(Some(&token), Some(&token))).is_ok());
    }

    #[test]
    fn mismatch_is_rejected() {
        let result = verify_csrf(&headers_with(Some("aaa"), Some("bbb")));
        assert!(matches!(result, Err(AuthError::CsrfRejected)));
    }

    #[test]
    fn missing_either_side_is_rejected() {
        let token = issue_csrf_token();
        assert!(matches!(
            verify_csrf(&headers_with(Some(&token), None)),
            Err(AuthError::CsrfRejected)
        ));
        assert!(matches!(
            verify_csrf(&headers_with(None, Some(&token))),
            Err(AuthError::CsrfRejected)
        ));
        assert!(matches!(
            verify_csrf(&headers_with(None, None)),
            Err(AuthError::CsrfRejected)
        ));
    }
}
