//! Password reset flow: request a link, then redeem it.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::state::AuthState;
use super::storage::SessionStore;
use super::types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest};
use super::utils::{normalize_email, valid_email};
use crate::api::email::reset_email;
use crate::password;
use crate::token::TokenClass;

/// Emails a reset link if the address is registered.
///
/// The response is the same either way; whether an address exists is never
/// revealed here.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = MessageResponse),
        (status = 400, description = "Missing or malformed email"),
    )
)]
pub async fn forgot_password(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.email.trim().is_empty() {
        return Err(AuthError::Validation("Email is required".to_string()));
    }

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if let Some(principal) = store.lookup_principal_by_email(&email).await? {
        let token = state.codec().issue(TokenClass::Reset, principal.id)?;
        let link = format!(
            "{}/reset-password/{token}",
            state.config().frontend_base_url()
        );

        let message = reset_email(&email, &link);
        if let Err(err) = state.email_sender().send(&message) {
            warn!("Failed to send reset email: {err}");
        }
        info!(user_id = %principal.id, "Password reset requested");
    } else {
        debug!("Password reset for an unknown email");
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Reset link sent to your email".to_string(),
        }),
    ))
}

/// Redeems a reset token and installs a new password.
///
/// The new password may not match the current one or any retired one; reuse
/// would undo the reason the reset happened. A successful reset also revokes
/// the active refresh token.
#[utoipa::path(
    patch,
    path = "/auth/reset-password/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Password reset token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Missing fields, weak password, or password reuse"),
        (status = 401, description = "Reset token invalid or expired"),
    )
)]
pub async fn reset_password(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }

    if !password::strong_password(&payload.password) {
        return Err(AuthError::Validation("Password is too weak".to_string()));
    }

    let user_id = state
        .codec()
        .verify(TokenClass::Reset, &token)
        .map_err(|err| {
            debug!("Reset token rejected: {err}");
            AuthError::InvalidToken
        })?;

    let record = store.lookup_password_record(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    let mut known_hashes = record.old_password_hashes;
    known_hashes.push(record.password_hash);
    if password::matches_any(payload.password.clone(), known_hashes).await? {
        return Err(AuthError::Conflict("Password already used".to_string()));
    }

    let new_hash = password::hash(payload.password).await?;
    store.update_password(user_id, &new_hash).await?;

    info!(%user_id, "Password reset");

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password reset successful".to_string(),
        }),
    ))
}
