//! Registration and email verification.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Json};
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::state::AuthState;
use super::storage::{SessionStore, SignupOutcome};
use super::types::{MessageResponse, RegisterRequest, ResendVerificationRequest};
use super::utils::{normalize_email, valid_email};
use crate::api::email::verification_email;
use crate::password;
use crate::token::TokenClass;

const REGISTERED_MESSAGE: &str = "Please check your email to verify your account";

/// Creates a pending account and emails a verification link.
///
/// A duplicate email returns the same 201 body as a fresh signup, so the
/// endpoint cannot be used to probe which addresses are registered.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Verification email sent", body = MessageResponse),
        (status = 400, description = "Missing fields, bad email, or weak password"),
    )
)]
pub async fn register(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AuthError::Validation(
            "Missing required fields".to_string(),
        ));
    }

    // Normalized once; the stored row, the email greeting, and the log line
    // all see the same value.
    let username = payload.username.trim().to_string();
    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if !password::strong_password(&payload.password) {
        return Err(AuthError::Validation("Password is too weak".to_string()));
    }

    let password_hash = password::hash(payload.password).await?;

    match store.insert_user(&username, &email, &password_hash).await? {
        SignupOutcome::Created(user_id) => {
            let token = state
                .codec()
                .issue(TokenClass::EmailVerification, user_id)?;
            let link = format!(
                "{}/auth/verify-email/{token}",
                state.config().public_base_url()
            );

            // Fire and log. A failed delivery should not fail the signup;
            // account recovery goes through the reset flow anyway.
            let message = verification_email(&email, &username, &link);
            if let Err(err) = state.email_sender().send(&message) {
                warn!("Failed to send verification email: {err}");
            }
            info!(%username, "User registered");
        }
        SignupOutcome::Conflict => {
            debug!("Registration for an already-registered email");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: REGISTERED_MESSAGE.to_string(),
        }),
    ))
}

/// Confirms an email address from the token in the link and redirects the
/// browser to the frontend's success or failure page.
///
/// Re-verifying an already-active account lands on the success page, so a
/// twice-clicked link never alarms the user.
#[utoipa::path(
    patch,
    path = "/auth/verify-email/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Email verification token")),
    responses(
        (status = 303, description = "Redirect to the frontend result page"),
    )
)]
pub async fn verify_email(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    let frontend = state.config().frontend_base_url();
    let failed = format!("{frontend}/final-register/failed");
    let success = format!("{frontend}/final-register/success");

    let user_id = match state.codec().verify(TokenClass::EmailVerification, &token) {
        Ok(user_id) => user_id,
        Err(err) => {
            debug!("Email verification token rejected: {err}");
            return Ok(Redirect::to(&failed));
        }
    };

    if store.activate_user(user_id).await? {
        info!(%user_id, "Email verified");
        Ok(Redirect::to(&success))
    } else {
        // Either an unknown user or a suspended account.
        match store.lookup_principal(user_id).await? {
            Some(principal) if principal.status == "active" => Ok(Redirect::to(&success)),
            _ => Ok(Redirect::to(&failed)),
        }
    }
}

/// Re-sends the verification email for an account still pending activation.
///
/// Responds identically whether the address is unknown, already active, or
/// pending. Only a pending account actually gets a fresh link.
#[utoipa::path(
    post,
    path = "/auth/resend-verification",
    tag = "auth",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email sent if applicable", body = MessageResponse),
        (status = 400, description = "Missing or malformed email"),
    )
)]
pub async fn resend_verification(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<Arc<dyn SessionStore>>,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.email.trim().is_empty() {
        return Err(AuthError::Validation("Email is required".to_string()));
    }

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    match store.lookup_principal_by_email(&email).await? {
        Some(principal) if principal.status == "pending" => {
            let token = state
                .codec()
                .issue(TokenClass::EmailVerification, principal.id)?;
            let link = format!(
                "{}/auth/verify-email/{token}",
                state.config().public_base_url()
            );

            let message = verification_email(&email, &principal.username, &link);
            if let Err(err) = state.email_sender().send(&message) {
                warn!("Failed to resend verification email: {err}");
            }
            info!(username = %principal.username, "Verification email resent");
        }
        Some(_) => debug!("Verification resend for a non-pending account"),
        None => debug!("Verification resend for an unknown email"),
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: REGISTERED_MESSAGE.to_string(),
        }),
    ))
}
