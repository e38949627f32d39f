//! Password hashing and strength policy.
//!
//! Hashes are Argon2id in PHC string form with a per-user random salt.
//! Hashing is deliberately slow, so the async entry points run on the
//! blocking pool and never stall other in-flight requests.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Strength policy: minimum length plus one of each character class
/// (lowercase, uppercase, digit, symbol).
#[must_use]
pub fn strong_password(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return false;
    }
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let symbol = password.chars().any(|c| !c.is_alphanumeric());
    lower && upper && digit && symbol
}

fn hash_sync(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

fn verify_sync(password: &str, phc_hash: &str) -> bool {
    // A malformed stored hash verifies as false rather than erroring; the
    // caller treats it as a credential mismatch.
    PasswordHash::new(phc_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Hash a password on the blocking pool.
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task is cancelled.
pub async fn hash(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_sync(&password))
        .await
        .context("password hashing task failed")?
}

/// Verify a password against a stored PHC hash on the blocking pool.
///
/// # Errors
///
/// Returns an error if the blocking task is cancelled.
pub async fn verify(password: String, phc_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_sync(&password, &phc_hash))
        .await
        .context("password verification task failed")
}

/// True if `password` matches any of `hashes` (used for reuse checks against
/// the current hash and the full history).
///
/// # Errors
///
/// Returns an error if the blocking task is cancelled.
pub async fn matches_any(password: String, hashes: Vec<String>) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        hashes
            .iter()
            .any(|candidate| verify_sync(&password, candidate))
    })
    .await
    .context("password history check task failed")
}
