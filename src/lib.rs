//! # Tessera (session token and credential service)
//!
//! `tessera` issues, verifies, and rotates the opaque session credentials of a
//! multi-tenant API, and throttles brute-force login attempts.
//!
//! ## Tokens
//!
//! Four token classes exist: `access`, `refresh`, `reset`, and
//! `email-verification`. A token is an HS256-signed structure whose payload is
//! the user identifier, encrypted with ChaCha20-Poly1305 under a key derived
//! from a long-lived secret and salt. Each class signs with its own secret, so
//! a token of one class can never be presented as another.
//!
//! ## Sessions
//!
//! Each user holds at most one live refresh token. Rotation replaces it with a
//! compare-and-set against the stored value; a superseded token is permanently
//! invalid even before its expiry. Login lockout grows exponentially after five
//! consecutive failures and clears itself once the window elapses.
//!
//! ## CSRF
//!
//! State-changing authenticated requests carry a double-submit CSRF token: the
//! value set in the `csrfToken` cookie must match the `csrf-token` header.

pub mod api;
pub mod cli;
pub mod password;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
