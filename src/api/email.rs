//! Outbound email delivery.
//!
//! Delivery is behind a trait so a real provider can be wired in without
//! touching the handlers; the default sink logs the message instead of
//! sending it.

use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub trait EmailSender: Send + Sync {
    /// Delivers the message.
    ///
    /// # Errors
    /// Returns an error when the provider rejects the message.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Logs messages instead of delivering them. The default until an SMTP or
/// API-based provider is configured.
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to_email,
            subject = %message.subject,
            body = %message.text,
            "Email delivery (log sink)"
        );
        Ok(())
    }
}

pub(crate) fn verification_email(to_email: &str, username: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Verify your email address".to_string(),
        text: format!(
            "Hello {username},\n\nPlease verify your email address by visiting the link below:\n\n{link}\n\nThe link expires in 15 minutes. If you did not create an account, you can ignore this message."
        ),
        html: format!(
            "<p>Hello {username},</p><p>Please verify your email address by clicking the link below:</p><p><a href=\"{link}\">Verify email</a></p><p>The link expires in 15 minutes. If you did not create an account, you can ignore this message.</p>"
        ),
    }
}

pub(crate) fn reset_email(to_email: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Reset your password".to_string(),
        text: format!(
            "A password reset was requested for your account.\n\nUse the link below to choose a new password:\n\n{link}\n\nThe link expires in 15 minutes. If you did not request a reset, you can ignore this message."
        ),
        html: format!(
            "<p>A password reset was requested for your account.</p><p><a href=\"{link}\">Choose a new password</a></p><p>The link expires in 15 minutes. If you did not request a reset, you can ignore this message.</p>"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_carries_link_and_name() {
        let message = verification_email(
            "reader@example.com",
            "reader",
            "http://localhost:8080/auth/verify-email/tok",
        );
        assert_eq!(message.to_email, "reader@example.com");
        assert!(message.text.contains("Hello reader"));
        assert!(message.text.contains("/auth/verify-email/tok"));
        assert!(message.html.contains("href=\"http://localhost:8080/auth/verify-email/tok\""));
    }

    #[test]
    fn reset_email_carries_link() {
        let message = reset_email("reader@example.com", "http://localhost:5173/reset-password/tok");
        assert!(message.text.contains("/reset-password/tok"));
        assert!(message.html.contains("href=\"http://localhost:5173/reset-password/tok\""));
    }

    #[test]
    fn log_sender_accepts_messages() {
        let message = reset_email("reader@example.com", "http://localhost/r/t");
        assert!(LogEmailSender.send(&message).is_ok());
    }
}
