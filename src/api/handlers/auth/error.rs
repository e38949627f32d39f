//! Error taxonomy for the auth endpoints.
//!
//! Internal detail (expired vs. tampered vs. malformed tokens, lockup state)
//! is logged where it happens; responses carry only the uniform message for
//! the category so failures give attackers no diagnostic feedback.

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input: missing fields, bad email, weak password.
    #[error("{0}")]
    Validation(String),
    /// Unknown user on a path that does not need enumeration protection.
    #[error("Email not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Uniform outcome for every token verification failure.
    #[error("Invalid token")]
    InvalidToken,
    /// Presented refresh token does not equal the stored one.
    #[error("Invalid refresh token")]
    TokenMismatch,
    #[error("Account is {status}")]
    AccountNotActive { status: String },
    #[error("CSRF token rejected")]
    CsrfRejected,
    #[error("Too many login attempts. Please wait for {wait_minutes} minutes")]
    TooManyAttempts {
        wait_minutes: i64,
        retry_after_seconds: i64,
    },
    /// Duplicate or reused value (e.g. a recycled password).
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::token::Error> for AuthError {
    fn from(err: crate::token::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::TokenMismatch | Self::AccountNotActive { .. } | Self::CsrfRejected => {
                StatusCode::FORBIDDEN
            }
            Self::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            // The chain stays in the log; the response is generic.
            error!("internal error: {err:?}");
        }

        let mut headers = HeaderMap::new();
        if let Self::TooManyAttempts {
            retry_after_seconds,
            ..
        } = &self
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                headers.insert(RETRY_AFTER, value);
            }
        }

        let body = Json(json!({ "message": self.to_string() }));
        (self.status(), headers, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            AuthError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenMismatch.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::CsrfRejected.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::TooManyAttempts {
                wait_minutes: 1,
                retry_after_seconds: 60
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::Conflict("dup".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn too_many_attempts_sets_retry_after() {
        let response = AuthError::TooManyAttempts {
            wait_minutes: 2,
            retry_after_seconds: 90,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(RETRY_AFTER).map(|v| v.to_str().ok()),
            Some(Some("90"))
        );
    }

    #[test]
    fn internal_message_is_generic() {
        let err = AuthError::Internal(anyhow!("database exploded at 3am"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
