use crate::{
    api,
    api::handlers::auth::AuthConfig,
    token::{SecretOverrides, TokenSecrets},
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_url: String,
    pub public_url: String,
    pub issuer: String,
    pub production: bool,
    pub cross_site: bool,
    pub access_token_secret: Option<SecretString>,
    pub refresh_token_secret: Option<SecretString>,
    pub reset_token_secret: Option<SecretString>,
    pub verification_token_secret: Option<SecretString>,
    pub encryption_key: Option<SecretString>,
    pub encryption_salt: Option<SecretString>,
}

/// Execute the server action.
///
/// # Errors
///
/// Returns an error if the cipher key cannot be derived or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let secrets = TokenSecrets::new(SecretOverrides {
        access: args.access_token_secret,
        refresh: args.refresh_token_secret,
        reset: args.reset_token_secret,
        verification: args.verification_token_secret,
        encryption_key: args.encryption_key,
        encryption_salt: args.encryption_salt,
    });

    let config = AuthConfig::new(args.frontend_url, args.public_url)
        .with_issuer(args.issuer)
        .with_production(args.production)
        .with_cross_site(args.cross_site);

    api::new(args.port, args.dsn, config, secrets).await
}
