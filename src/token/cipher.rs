//! Symmetric encryption of the identity payload embedded in tokens.

use anyhow::{anyhow, Result};
use argon2::Argon2;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

const NONCE_LEN: usize = 12;
const MIN_SALT_LEN: usize = 8;

/// ChaCha20-Poly1305 cipher keyed once at startup.
///
/// The key is derived from a long-lived secret and salt with Argon2id; the raw
/// secret is never used as key material. Output layout is
/// `nonce (12 bytes) || ciphertext`, so decryption is self-contained.
pub struct PayloadCipher {
    key: Key,
}

impl PayloadCipher {
    /// Derive the cipher key from the configured secret and salt.
    ///
    /// # Errors
    ///
    /// Returns an error if the salt is shorter than 8 bytes or derivation fails.
    pub fn derive(secret: &[u8], salt: &[u8]) -> Result<Self> {
        if salt.len() < MIN_SALT_LEN {
            return Err(anyhow!("cipher salt must be at least {MIN_SALT_LEN} bytes"));
        }

        let mut key_bytes = [0u8; 32];
        Argon2::default()
            .hash_password_into(secret, salt, &mut key_bytes)
            .map_err(|err| anyhow!("cipher key derivation failed: {err}"))?;

        Ok(Self {
            key: *Key::from_slice(&key_bytes),
        })
    }

    /// Encrypt a payload under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(&self.key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|err| anyhow!("failed to generate nonce: {err}"))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|err| anyhow!("encryption failure: {err}"))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Decrypt `nonce || ciphertext` produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns an error on malformed input, a wrong key, or tampered
    /// ciphertext. Callers treat all three identically.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < NONCE_LEN {
            return Err(anyhow!("invalid ciphertext length"));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = ChaCha20Poly1305::new(&self.key);
        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|err| anyhow!("decryption failure: {err}"))?;

        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> PayloadCipher {
        PayloadCipher::derive(b"a-long-lived-secret", b"fixed-salt-value").unwrap()
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = cipher();
        let payload = b"b0f3f1f0-544e-4f13-8e60-97b0b11b0f3f";

        let encrypted = cipher.encrypt(payload).unwrap();
        assert_ne!(encrypted.as_slice(), payload.as_slice());
        assert!(encrypted.len() > payload.len());

        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_nonce_is_fresh_per_call() {
        let cipher = cipher();
        let first = cipher.encrypt(b"payload").unwrap();
        let second = cipher.encrypt(b"payload").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_decrypt_fails_wrong_key() {
        let encrypted = cipher().encrypt(b"secret").unwrap();
        let other =
            PayloadCipher::derive(b"another-long-lived-secret", b"fixed-salt-value").unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used, clippy::indexing_slicing)]
    fn test_decrypt_fails_tampered_ciphertext() {
        let cipher = cipher();
        let mut encrypted = cipher.encrypt(b"secret").unwrap();

        let len = encrypted.len();
        if let Some(byte) = encrypted.get_mut(len - 1) {
            *byte ^= 0xFF;
        }

        assert!(cipher.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_decrypt_fails_short_input() {
        assert!(cipher().decrypt(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_derive_rejects_short_salt() {
        assert!(PayloadCipher::derive(b"secret", b"short").is_err());
    }
}
