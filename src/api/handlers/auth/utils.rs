//! Header, cookie, and input helpers shared by the auth handlers.

use std::sync::OnceLock;

use axum::http::{header, HeaderMap};
use regex::Regex;

use super::state::AuthConfig;

pub(super) const ACCESS_COOKIE_NAME: &str = "accessToken";
pub(super) const REFRESH_COOKIE_NAME: &str = "refreshToken";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

/// Lowercase and trim, so lookups and uniqueness checks agree on a single
/// canonical form.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(super) fn valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Returns the value of `name` from the `Cookie` header, if present.
pub(super) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Access tokens may arrive as a cookie, a bare header, or a bearer token,
/// in that order of precedence.
pub(super) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie(headers, ACCESS_COOKIE_NAME) {
        return Some(token);
    }

    if let Some(token) = headers.get("x-access-token").and_then(|v| v.to_str().ok()) {
        return Some(token.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

pub(super) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie(headers, REFRESH_COOKIE_NAME) {
        return Some(token);
    }

    headers
        .get("x-refresh-token")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Best-effort client address for audit logs, honoring proxy headers.
pub(super) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn cookie_attributes(config: &AuthConfig, max_age: Option<i64>) -> String {
    let mut attrs = format!("; Path=/; SameSite={}", config.cookie_same_site());

    if config.cookie_secure() {
        attrs.push_str("; Secure");
    }

    if let Some(seconds) = max_age {
        attrs.push_str(&format!("; Max-Age={seconds}"));
    }

    attrs
}

/// Session cookies are `HttpOnly`; without `remember` they stay session-scoped
/// (no `Max-Age`) and die with the browser. With `remember` all cookies live
/// for the full window; the tokens inside still expire at their own TTLs.
pub(super) fn session_cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    remember: bool,
) -> String {
    let max_age = remember.then(|| config.remember_ttl_seconds());

    format!(
        "{name}={value}; HttpOnly{}",
        cookie_attributes(config, max_age)
    )
}

/// The CSRF cookie must be readable by frontend scripts, so no `HttpOnly`.
pub(super) fn csrf_cookie(config: &AuthConfig, value: &str, remember: bool) -> String {
    let max_age = remember.then(|| config.remember_ttl_seconds());
    format!(
        "{}={value}{}",
        super::csrf::CSRF_COOKIE_NAME,
        cookie_attributes(config, max_age)
    )
}

/// The full cookie bundle set after a login or a refresh rotation.
pub(super) fn session_cookie_headers(
    config: &AuthConfig,
    access_token: &str,
    refresh_token: &str,
    csrf_token: &str,
    remember: bool,
) -> [(axum::http::HeaderName, String); 3] {
    [
        (
            header::SET_COOKIE,
            session_cookie(config, ACCESS_COOKIE_NAME, access_token, remember),
        ),
        (
            header::SET_COOKIE,
            session_cookie(config, REFRESH_COOKIE_NAME, refresh_token, remember),
        ),
        (header::SET_COOKIE, csrf_cookie(config, csrf_token, remember)),
    ]
}

/// An expired duplicate of the cookie, instructing the browser to drop it.
pub(super) fn clear_cookie(config: &AuthConfig, name: &str) -> String {
    format!("{name}=; HttpOnly{}", cookie_attributes(config, Some(0)))
}

/// Postgres unique violation, SQLSTATE 23505.
pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}
