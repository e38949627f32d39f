//! Auth configuration and shared request state.

use std::sync::Arc;

use crate::api::email::EmailSender;
use crate::token::TokenCodec;

const DEFAULT_ISSUER: &str = "localhost";
const DEFAULT_REMEMBER_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Immutable auth configuration, built once at startup and injected into
/// handlers; request code never reads ambient process state.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    public_base_url: String,
    issuer: String,
    production: bool,
    cross_site: bool,
    remember_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, public_base_url: String) -> Self {
        Self {
            frontend_base_url,
            public_base_url,
            issuer: DEFAULT_ISSUER.to_string(),
            production: false,
            cross_site: false,
            remember_ttl_seconds: DEFAULT_REMEMBER_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_cross_site(mut self, cross_site: bool) -> Self {
        self.cross_site = cross_site;
        self
    }

    #[must_use]
    pub fn with_remember_ttl_seconds(mut self, seconds: i64) -> Self {
        self.remember_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub(super) fn remember_ttl_seconds(&self) -> i64 {
        self.remember_ttl_seconds
    }

    /// Cookies carry `Secure` only when serving over HTTPS.
    pub(super) fn cookie_secure(&self) -> bool {
        self.production || self.cross_site
    }

    /// Cross-site deployments need `SameSite=None` (with `Secure`); same-site
    /// stays on `Lax`.
    pub(super) fn cookie_same_site(&self) -> &'static str {
        if self.cross_site {
            "None"
        } else {
            "Lax"
        }
    }
}

pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    email: Arc<dyn EmailSender>,
}

impl AuthState {
    pub fn new(config: AuthConfig, codec: TokenCodec, email: Arc<dyn EmailSender>) -> Self {
        Self {
            config,
            codec,
            email,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub(super) fn email_sender(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }
}
