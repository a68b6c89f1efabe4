//! Cloudflare Turnstile verification for form posts.

use anyhow::{Context, Result};
use axum::http::{HeaderMap, StatusCode};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, instrument};

use crate::APP_USER_AGENT;

pub const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";
/// Form field the widget fills in.
pub const TURNSTILE_FIELD: &str = "cf-turnstile-response";

#[derive(Debug)]
pub enum TurnstileError {
    Missing,
    Rejected(Vec<String>),
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

pub struct TurnstileVerifier {
    client: Client,
    secret: SecretString,
    verify_url: String,
}

impl TurnstileVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(secret: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build Turnstile client")?;
        Ok(Self {
            client,
            secret,
            verify_url: SITEVERIFY_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_verify_url(mut self, verify_url: String) -> Self {
        self.verify_url = verify_url;
        self
    }

    /// Check a widget response with the siteverify endpoint.
    ///
    /// # Errors
    /// Returns [`TurnstileError`] when the token is missing, rejected, or cannot be checked.
    #[instrument(skip_all)]
    pub async fn verify(
        &self,
        response: Option<&str>,
        remote_ip: Option<&str>,
    ) -> Result<(), TurnstileError> {
        let Some(response) = response.map(str::trim).filter(|value| !value.is_empty()) else {
            return Err(TurnstileError::Missing);
        };

        let mut params = vec![
            ("secret", self.secret.expose_secret()),
            ("response", response),
        ];
        if let Some(ip) = remote_ip {
            params.push(("remoteip", ip));
        }

        let outcome = match self.client.post(&self.verify_url).form(&params).send().await {
            Ok(reply) => reply.json::<SiteVerifyResponse>().await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(SiteVerifyResponse { success: true, .. }) => Ok(()),
            Ok(SiteVerifyResponse { error_codes, .. }) => Err(TurnstileError::Rejected(error_codes)),
            Err(err) => {
                error!("Turnstile siteverify failed: {err}");
                Err(TurnstileError::Unavailable)
            }
        }
    }
}

pub fn turnstile_error_response(err: &TurnstileError) -> (StatusCode, String) {
    match err {
        TurnstileError::Missing => (
            StatusCode::BAD_REQUEST,
            "Missing Turnstile token".to_string(),
        ),
        TurnstileError::Rejected(_) => (
            StatusCode::BAD_REQUEST,
            "Turnstile check failed".to_string(),
        ),
        TurnstileError::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Turnstile unavailable".to_string(),
        ),
    }
}

/// Extract a client IP from common proxy headers.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
