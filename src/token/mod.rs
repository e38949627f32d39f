//! Token codec: signed, expiring bearer tokens over an encrypted identity.
//!
//! A token is a compact three-part structure `header.claims.signature`
//! (base64url, HS256). The claims carry the ciphertext of the user identifier
//! produced by [`cipher::PayloadCipher`], the issuer, and the expiry derived
//! from the class TTL. Signature and expiry are checked before any decryption
//! so the cheap, attacker-uncontrolled checks run first; callers collapse
//! every failure into one opaque invalid-token outcome.

pub mod cipher;
mod secrets;

pub use cipher::PayloadCipher;
pub use secrets::{SecretOverrides, TokenSecrets};

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Token classes; each has a fixed TTL and an independent signing secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenClass {
    Access,
    Refresh,
    Reset,
    EmailVerification,
}

impl TokenClass {
    /// Time-to-live baked into the token itself. The `remember` login option
    /// extends cookie lifetime only, never these values.
    #[must_use]
    pub fn ttl_seconds(self) -> i64 {
        match self {
            Self::Access => 15 * 60,
            Self::Refresh => 7 * 24 * 60 * 60,
            Self::Reset | Self::EmailVerification => 15 * 60,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Reset => "reset",
            Self::EmailVerification => "email-verification",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("token expired")]
    Expired,
    #[error("cipher key derivation failed")]
    KeyDerivation,
    #[error("payload decryption failed")]
    Crypto,
    #[error("invalid identity payload")]
    Identity,
    #[error("invalid key length")]
    KeyLength,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenClaims {
    /// Base64url `nonce || ciphertext` of the user identifier.
    data: String,
    iss: String,
    iat: i64,
    exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues and verifies tokens of every class.
///
/// Built once at startup from the process secrets and injected into request
/// handling; request code never reads ambient secret state.
pub struct TokenCodec {
    cipher: PayloadCipher,
    secrets: TokenSecrets,
    issuer: String,
}

impl TokenCodec {
    /// Derive the payload cipher and wrap the signing secrets.
    ///
    /// # Errors
    ///
    /// Returns an error if cipher key derivation fails (e.g. a too-short salt).
    pub fn new(secrets: TokenSecrets, issuer: String) -> Result<Self, Error> {
        let cipher = PayloadCipher::derive(secrets.encryption_key(), secrets.encryption_salt())
            .map_err(|_| Error::KeyDerivation)?;
        Ok(Self {
            cipher,
            secrets,
            issuer,
        })
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token of `class` for `user_id`, expiring after the class TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if payload encryption or signing fails.
    pub fn issue(&self, class: TokenClass, user_id: Uuid) -> Result<String, Error> {
        self.issue_at(class, user_id, unix_now())
    }

    /// Issue a token with an explicit clock, for callers that control time.
    ///
    /// # Errors
    ///
    /// Returns an error if payload encryption or signing fails.
    pub fn issue_at(
        &self,
        class: TokenClass,
        user_id: Uuid,
        now_unix_seconds: i64,
    ) -> Result<String, Error> {
        let encrypted = self
            .cipher
            .encrypt(user_id.as_bytes())
            .map_err(|_| Error::Crypto)?;

        let claims = TokenClaims {
            data: Base64UrlUnpadded::encode_string(&encrypted),
            iss: self.issuer.clone(),
            iat: now_unix_seconds,
            exp: now_unix_seconds.saturating_add(class.ttl_seconds()),
        };

        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let signature = self.sign(class, &signing_input)?;
        let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a token of `class` and return the embedded user identifier.
    ///
    /// # Errors
    ///
    /// Returns an error on any malformed, tampered, expired, cross-class, or
    /// undecryptable token. The variants exist for logging; callers must not
    /// expose the distinction.
    pub fn verify(&self, class: TokenClass, token: &str) -> Result<Uuid, Error> {
        self.verify_at(class, token, unix_now())
    }

    /// Verify with an explicit clock, for callers that control time.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify`].
    pub fn verify_at(
        &self,
        class: TokenClass,
        token: &str,
        now_unix_seconds: i64,
    ) -> Result<Uuid, Error> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
        if parts.next().is_some() {
            return Err(Error::TokenFormat);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        // Signature first: everything after this point is authenticated input.
        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        self.verify_signature(class, &signing_input, &signature)?;

        let claims: TokenClaims = b64d_json(claims_b64)?;
        if claims.iss != self.issuer {
            return Err(Error::InvalidIssuer);
        }
        if claims.exp <= now_unix_seconds {
            return Err(Error::Expired);
        }

        let encrypted = Base64UrlUnpadded::decode_vec(&claims.data).map_err(|_| Error::Base64)?;
        let plaintext = self.cipher.decrypt(&encrypted).map_err(|_| Error::Crypto)?;
        Uuid::from_slice(&plaintext).map_err(|_| Error::Identity)
    }

    fn sign(&self, class: TokenClass, input: &str) -> Result<Vec<u8>, Error> {
        let secret = self.secrets.class_secret(class).expose_secret();
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| Error::KeyLength)?;
        mac.update(input.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify_signature(
        &self,
        class: TokenClass,
        input: &str,
        signature: &[u8],
    ) -> Result<(), Error> {
        let secret = self.secrets.class_secret(class).expose_secret();
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| Error::KeyLength)?;
        mac.update(input.as_bytes());
        // Mac::verify_slice is constant-time.
        mac.verify_slice(signature)
            .map_err(|_| Error::InvalidSignature)
    }
}
