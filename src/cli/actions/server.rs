use crate::{
    session::{AuthApiClient, SessionStore},
    site::{self, turnstile::TurnstileVerifier, SiteConfig, SiteState},
};
use anyhow::Result;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub auth_api_url: Url,
    pub auth_api_timeout: Duration,
    pub session_resolve_budget: Duration,
    pub session_cache_ttl: Duration,
    pub turnstile_secret: Option<SecretString>,
    pub turnstile_site_key: Option<String>,
    pub cdn_base_url: Option<Url>,
    pub resend_cooldown_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if a client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let auth_api = AuthApiClient::new(args.auth_api_url, args.auth_api_timeout)?;
    let sessions = SessionStore::new(Arc::new(auth_api), args.session_cache_ttl);

    let turnstile = args
        .turnstile_secret
        .map(TurnstileVerifier::new)
        .transpose()?;

    let config = SiteConfig::new()
        .with_cdn_base_url(args.cdn_base_url)
        .with_turnstile_site_key(args.turnstile_site_key)
        .with_resend_cooldown_seconds(args.resend_cooldown_seconds)
        .with_session_resolve_budget(args.session_resolve_budget);

    let state = SiteState::new(config, sessions).with_turnstile(turnstile);

    site::new(args.port, Arc::new(state)).await
}
