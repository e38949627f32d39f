//! Login with password verification and exponential lockout.

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use tracing::{info, warn};

use super::csrf::issue_csrf_token;
use super::error::AuthError;
use super::lockout::{self, Gate};
use super::state::AuthState;
use super::storage::SessionStore;
use super::types::{LoginRequest, LoginResponse};
use super::utils::{extract_client_ip, normalize_email, session_cookie_headers, valid_email};
use crate::password;
use crate::token::{unix_now, TokenClass};

/// Authenticates a user and opens a session.
///
/// The lockout gate is checked before the password so a locked account does
/// no hash work at all. Failures past the threshold double the wait each
/// time; a success resets the counter and replaces any previous session's
/// refresh token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Account not active"),
        (status = 404, description = "Email not found"),
        (status = 429, description = "Account temporarily locked"),
    )
)]
pub async fn login(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    let record = store.lookup_auth_record(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let now = unix_now();
    if let Gate::Locked {
        retry_after_seconds,
    } = lockout::gate(record.locked_until_unix, now)
    {
        warn!(
            client_ip = extract_client_ip(&headers).as_deref(),
            "Login attempt against locked account"
        );
        return Err(AuthError::TooManyAttempts {
            wait_minutes: lockout::wait_minutes(retry_after_seconds),
            retry_after_seconds,
        });
    }

    if !password::verify(payload.password, record.password_hash).await? {
        let (failed_count, locked_until) = lockout::penalize(record.failed_login_count, now);
        store.record_login_failure(record.id, failed_count, locked_until).await?;

        if locked_until.is_some() {
            warn!(
                client_ip = extract_client_ip(&headers).as_deref(),
                failed_count, "Account locked after repeated login failures"
            );
        }
        return Err(AuthError::InvalidCredentials);
    }

    if record.status != "active" {
        return Err(AuthError::AccountNotActive {
            status: record.status,
        });
    }

    let access_token = state.codec().issue(TokenClass::Access, record.id)?;
    let refresh_token = state.codec().issue(TokenClass::Refresh, record.id)?;
    let csrf_token = issue_csrf_token();

    store.record_login_success(record.id, &refresh_token).await?;

    info!(username = %record.username, "Login successful");

    let cookies = AppendHeaders(session_cookie_headers(
        state.config(),
        &access_token,
        &refresh_token,
        &csrf_token,
        payload.remember,
    ));

    Ok((
        StatusCode::OK,
        cookies,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            username: record.username,
            user_id: record.id.to_string(),
        }),
    ))
}
