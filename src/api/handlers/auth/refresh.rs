//! Refresh-token rotation.

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use tracing::debug;

use super::csrf::issue_csrf_token;
use super::error::AuthError;
use super::state::AuthState;
use super::storage::SessionStore;
use super::types::MessageResponse;
use super::utils::{extract_refresh_token, session_cookie_headers};
use crate::token::TokenClass;

/// Exchanges a valid refresh token for a fresh access/refresh pair.
///
/// Rotation is single-use: the stored token must match the presented one,
/// and the swap is a compare-and-set so only one of two racing refreshes
/// with the same token wins.
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    tag = "auth",
    responses(
        (status = 200, description = "Token refreshed", body = MessageResponse),
        (status = 400, description = "No refresh token presented"),
        (status = 401, description = "Refresh token invalid or expired"),
        (status = 403, description = "Refresh token superseded"),
    )
)]
pub async fn refresh(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let presented = extract_refresh_token(&headers)
        .ok_or_else(|| AuthError::Validation("Refresh token is required".to_string()))?;

    let user_id = state
        .codec()
        .verify(TokenClass::Refresh, &presented)
        .map_err(|err| {
            debug!("Refresh token rejected: {err}");
            AuthError::InvalidToken
        })?;

    let record = store.lookup_refresh_record(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    match record.current_refresh_token {
        Some(stored) if stored == presented => {}
        _ => return Err(AuthError::TokenMismatch),
    }

    let access_token = state.codec().issue(TokenClass::Access, user_id)?;
    let replacement = state.codec().issue(TokenClass::Refresh, user_id)?;
    let csrf_token = issue_csrf_token();

    // A concurrent refresh may have rotated the token between the read and
    // this write. The loser sees zero rows and is treated as a stale token.
    if !store.rotate_refresh_token(user_id, &presented, &replacement).await? {
        return Err(AuthError::TokenMismatch);
    }

    let cookies = AppendHeaders(session_cookie_headers(
        state.config(),
        &access_token,
        &replacement,
        &csrf_token,
        false,
    ));

    Ok((
        StatusCode::OK,
        cookies,
        Json(MessageResponse {
            message: "Token refreshed".to_string(),
        }),
    ))
}
