//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Extends cookie lifetime to seven days; token TTLs are unaffected.
    #[serde(default)]
    pub remember: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
    pub user_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn login_request_remember_defaults_to_false() -> Result<()> {
        let decoded: LoginRequest =
            serde_json::from_str(r#"{"email":"a@example.com","password":"pw"}"#)?;
        assert!(!decoded.remember);
        assert_eq!(decoded.email, "a@example.com");
        Ok(())
    }

    #[test]
    fn login_response_round_trips() -> Result<()> {
        let response = LoginResponse {
            message: "Login successful".to_string(),
            username: "alice".to_string(),
            user_id: "0".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(
            value.get("message").and_then(serde_json::Value::as_str),
            Some("Login successful")
        );
        let decoded: LoginResponse = serde_json::from_value(value)?;
        assert_eq!(decoded.username, "alice");
        Ok(())
    }
}
