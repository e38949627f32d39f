//! Access-token authentication and logout.

use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use tracing::{debug, warn};

use super::csrf::verify_csrf;
use super::error::AuthError;
use super::state::AuthState;
use super::storage::{Principal, SessionStore};
use super::types::MessageResponse;
use super::utils::{
    clear_cookie, extract_access_token, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME,
};
use crate::token::TokenClass;

/// Resolves the request's access token into a known user.
///
/// Any verification failure collapses to `InvalidToken`; the precise reason
/// is logged but never surfaced to the client.
pub(super) async fn authenticate(
    state: &AuthState,
    store: &Arc<dyn SessionStore>,
    headers: &HeaderMap,
) -> Result<Principal, AuthError> {
    let token = extract_access_token(headers).ok_or(AuthError::InvalidToken)?;

    let user_id = state
        .codec()
        .verify(TokenClass::Access, &token)
        .map_err(|err| {
            debug!("Access token rejected: {err}");
            AuthError::InvalidToken
        })?;

    store
        .lookup_principal(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)
}

/// Logout clears the session cookies and drops the stored refresh token.
///
/// CSRF is enforced even here: a forged logout is only a nuisance, but it is
/// still a state change on behalf of the victim. Cookie clearing always
/// happens, whether or not the access token still resolves.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session cleared", body = MessageResponse),
        (status = 403, description = "CSRF check failed"),
    )
)]
pub async fn logout(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    verify_csrf(&headers)?;

    // Best effort: an expired access token should not keep the user from
    // logging out, so failures here only lose the server-side revocation.
    match authenticate(&state, &store, &headers).await {
        Ok(principal) => {
            if let Err(err) = store.clear_refresh_token(principal.id).await {
                warn!("Failed to clear refresh token on logout: {err}");
            }
        }
        Err(err) => debug!("Logout without a valid session: {err}"),
    }

    let config = state.config();
    let response_headers = AppendHeaders([
        (
            header::SET_COOKIE,
            clear_cookie(config, ACCESS_COOKIE_NAME),
        ),
        (
            header::SET_COOKIE,
            clear_cookie(config, REFRESH_COOKIE_NAME),
        ),
        (
            header::SET_COOKIE,
            clear_cookie(config, super::csrf::CSRF_COOKIE_NAME),
        ),
    ]);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    ))
}
