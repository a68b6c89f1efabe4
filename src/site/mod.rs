use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use secrecy::ExposeSecret;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    gate::{ProtectedRoute, SessionSnapshot},
    session::{extract_session_token, SessionStore},
};

pub mod cdn;
pub mod guard;
pub(crate) mod handlers;
mod openapi;
pub mod packages;
pub mod rate_limit;
pub mod turnstile;
pub mod views;

pub use guard::protect;
pub use openapi::openapi;

use self::{
    handlers::{health, pages, verification},
    rate_limit::{resend_limiter, RateLimiter},
    turnstile::TurnstileVerifier,
};

pub const DASHBOARD: ProtectedRoute = ProtectedRoute::new("/dashboard");
pub const CHECKOUT: ProtectedRoute = ProtectedRoute::new("/checkout/:package_id");
pub const ADMIN: ProtectedRoute = ProtectedRoute::new("/admin").admin_only();

const DEFAULT_RESOLVE_BUDGET_MS: u64 = 250;
const DEFAULT_RESEND_COOLDOWN_SECONDS: u64 = 60;

#[derive(Clone, Debug)]
pub struct SiteConfig {
    cdn_base_url: Option<Url>,
    turnstile_site_key: Option<String>,
    resend_cooldown_seconds: u64,
    session_resolve_budget: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cdn_base_url: None,
            turnstile_site_key: None,
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
            session_resolve_budget: Duration::from_millis(DEFAULT_RESOLVE_BUDGET_MS),
        }
    }

    #[must_use]
    pub fn with_cdn_base_url(mut self, url: Option<Url>) -> Self {
        self.cdn_base_url = url;
        self
    }

    #[must_use]
    pub fn with_turnstile_site_key(mut self, key: Option<String>) -> Self {
        self.turnstile_site_key = key;
        self
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_resolve_budget(mut self, budget: Duration) -> Self {
        self.session_resolve_budget = budget;
        self
    }

    #[must_use]
    pub fn cdn_base_url(&self) -> Option<&Url> {
        self.cdn_base_url.as_ref()
    }

    #[must_use]
    pub fn turnstile_site_key(&self) -> Option<&str> {
        self.turnstile_site_key.as_deref()
    }

    #[must_use]
    pub fn resend_cooldown_seconds(&self) -> u64 {
        self.resend_cooldown_seconds
    }

    #[must_use]
    pub fn session_resolve_budget(&self) -> Duration {
        self.session_resolve_budget
    }
}

/// Shared state for the router, guards and handlers.
pub struct SiteState {
    config: SiteConfig,
    sessions: SessionStore,
    turnstile: Option<TurnstileVerifier>,
    resend_limiter: Arc<dyn RateLimiter>,
}

impl SiteState {
    #[must_use]
    pub fn new(config: SiteConfig, sessions: SessionStore) -> Self {
        let resend_limiter = resend_limiter(config.resend_cooldown_seconds());
        Self {
            config,
            sessions,
            turnstile: None,
            resend_limiter,
        }
    }

    #[must_use]
    pub fn with_turnstile(mut self, verifier: Option<TurnstileVerifier>) -> Self {
        self.turnstile = verifier;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn turnstile(&self) -> Option<&TurnstileVerifier> {
        self.turnstile.as_ref()
    }

    #[must_use]
    pub fn resend_limiter(&self) -> &dyn RateLimiter {
        self.resend_limiter.as_ref()
    }

    /// Current session snapshot for the caller identified by `headers`.
    pub async fn snapshot(&self, headers: &HeaderMap) -> SessionSnapshot {
        let token = extract_session_token(headers);
        self.sessions
            .snapshot(
                token.as_ref().map(|secret| secret.expose_secret()),
                self.config.session_resolve_budget(),
            )
            .await
    }

    /// Drop the cached session of the caller identified by `headers`.
    pub async fn forget_session(&self, headers: &HeaderMap) {
        if let Some(token) = extract_session_token(headers) {
            self.sessions.invalidate(token.expose_secret()).await;
        }
    }
}

/// Build the site router with public pages, guarded views, and API docs.
pub fn router(site: Arc<SiteState>) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/auth", get(pages::sign_in))
        .route(DASHBOARD.path, protect(DASHBOARD, pages::dashboard, &site))
        .route(CHECKOUT.path, protect(CHECKOUT, pages::checkout, &site))
        .route(ADMIN.path, protect(ADMIN, pages::admin, &site))
        .route(
            "/auth/resend-verification",
            post(verification::resend_verification),
        )
        .route("/health", get(health::health).options(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(Extension(site))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, site: Arc<SiteState>) -> Result<()> {
    let app = router(site).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Gracefully shutdown");
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
