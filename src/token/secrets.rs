//! Process-wide secret material for signing and payload encryption.
//!
//! Secrets are loaded once at startup and treated as immutable for the
//! process lifetime. Each token class signs with its own secret so a
//! compromise or replay of one class never crosses into another.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::TokenClass;

const GENERATED_SECRET_LEN: usize = 48;

/// Optional operator-provided secrets; anything absent is generated.
#[derive(Debug, Default)]
pub struct SecretOverrides {
    pub access: Option<SecretString>,
    pub refresh: Option<SecretString>,
    pub reset: Option<SecretString>,
    pub verification: Option<SecretString>,
    pub encryption_key: Option<SecretString>,
    pub encryption_salt: Option<SecretString>,
}

/// Per-class signing secrets plus the cipher key inputs.
pub struct TokenSecrets {
    access: SecretString,
    refresh: SecretString,
    reset: SecretString,
    verification: SecretString,
    encryption_key: SecretString,
    encryption_salt: SecretString,
}

impl TokenSecrets {
    /// Build the secret set, generating any value the operator did not supply.
    ///
    /// Generated secrets are process-local: tokens signed with them die with
    /// the process, which is logged so operators know to pin the values.
    #[must_use]
    pub fn new(overrides: SecretOverrides) -> Self {
        Self {
            access: resolve("access token secret", overrides.access),
            refresh: resolve("refresh token secret", overrides.refresh),
            reset: resolve("reset token secret", overrides.reset),
            verification: resolve("verification token secret", overrides.verification),
            encryption_key: resolve("encryption key", overrides.encryption_key),
            encryption_salt: resolve("encryption salt", overrides.encryption_salt),
        }
    }

    pub(super) fn class_secret(&self, class: TokenClass) -> &SecretString {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
            TokenClass::Reset => &self.reset,
            TokenClass::EmailVerification => &self.verification,
        }
    }

    pub(super) fn encryption_key(&self) -> &[u8] {
        self.encryption_key.expose_secret().as_bytes()
    }

    pub(super) fn encryption_salt(&self) -> &[u8] {
        self.encryption_salt.expose_secret().as_bytes()
    }
}

fn resolve(name: &str, provided: Option<SecretString>) -> SecretString {
    if let Some(secret) = provided {
        return secret;
    }
    warn!("no {name} configured; generated one that will not survive a restart");
    generate_secret()
}

fn generate_secret() -> SecretString {
    let mut bytes = [0u8; GENERATED_SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    SecretString::from(Base64UrlUnpadded::encode_string(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_provided_secrets() {
        let secrets = TokenSecrets::new(SecretOverrides {
            access: Some(SecretString::from("pinned".to_string())),
            ..SecretOverrides::default()
        });
        assert_eq!(
            secrets.class_secret(TokenClass::Access).expose_secret(),
            "pinned"
        );
    }

    #[test]
    fn new_generates_missing_secrets() {
        let secrets = TokenSecrets::new(SecretOverrides::default());
        assert!(!secrets.class_secret(TokenClass::Refresh).expose_secret().is_empty());
        assert!(secrets.encryption_salt().len() >= 8);
    }

    #[test]
    fn generated_secrets_are_distinct() {
        let secrets = TokenSecrets::new(SecretOverrides::default());
        let other = TokenSecrets::new(SecretOverrides::default());
        assert_ne!(
            secrets.class_secret(TokenClass::Access).expose_secret(),
            other.class_secret(TokenClass::Access).expose_secret()
        );
        assert_ne!(
            secrets.class_secret(TokenClass::Access).expose_secret(),
            secrets.class_secret(TokenClass::Refresh).expose_secret()
        );
    }
}
