//! HTTP client for the external auth API.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{SessionFuture, SessionSource, UnitFuture};
use crate::{gate::SessionUser, APP_USER_AGENT};

const SESSION_ENDPOINT: &str = "/v1/auth/session";
const RESEND_ENDPOINT: &str = "/v1/auth/resend-verification";

/// Resolves session tokens and forwards verification resends to the auth API.
#[derive(Clone, Debug)]
pub struct AuthApiClient {
    client: Client,
    base_url: Url,
}

impl AuthApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build auth API client")?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    #[instrument(skip_all)]
    async fn fetch_session(&self, token: &str) -> Result<Option<SessionUser>> {
        let url = self.endpoint(SESSION_ENDPOINT);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Session lookup failed: {url}"))?;

        match response.status() {
            StatusCode::OK => {
                let user = response
                    .json::<SessionUser>()
                    .await
                    .context("Invalid session payload from auth API")?;
                debug!(user_id = %user.user_id, "session resolved");
                Ok(Some(user))
            }
            StatusCode::NO_CONTENT | StatusCode::UNAUTHORIZED => Ok(None),
            status => Err(anyhow!("{url} - {status}")),
        }
    }

    #[instrument(skip_all)]
    async fn post_resend(&self, email: &str) -> Result<()> {
        let url = self.endpoint(RESEND_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "email": email }))
            .send()
            .await
            .with_context(|| format!("Resend verification failed: {url}"))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(anyhow!("{url} - {status}"))
        }
    }
}

impl SessionSource for AuthApiClient {
    fn resolve<'a>(&'a self, token: &'a str) -> SessionFuture<'a> {
        Box::pin(self.fetch_session(token))
    }

    fn resend_verification<'a>(&'a self, email: &'a str) -> UnitFuture<'a> {
        Box::pin(self.post_resend(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() -> Result<()> {
        let client = AuthApiClient::new(
            Url::parse("https://auth.streamlift.tv/")?,
            Duration::from_secs(1),
        )?;
        assert_eq!(
            client.endpoint(SESSION_ENDPOINT),
            "https://auth.streamlift.tv/v1/auth/session"
        );
        Ok(())
    }

    #[test]
    fn endpoint_keeps_base_path() -> Result<()> {
        let client = AuthApiClient::new(
            Url::parse("http://127.0.0.1:9000/api")?,
            Duration::from_secs(1),
        )?;
        assert_eq!(
            client.endpoint(RESEND_ENDPOINT),
            "http://127.0.0.1:9000/api/v1/auth/resend-verification"
        );
        Ok(())
    }
}
