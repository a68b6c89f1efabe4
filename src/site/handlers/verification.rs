//! Verification email resend, the single action offered by the verification notice.

use axum::{
    extract::{Extension, Form},
    http::{header::RETRY_AFTER, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    gate::{LANDING_PATH, SIGN_IN_PATH},
    site::{
        rate_limit::RateLimitDecision,
        turnstile::{extract_client_ip, turnstile_error_response},
        views, SiteState,
    },
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResendForm {
    /// Turnstile widget response, required when Turnstile is configured.
    #[serde(rename = "cf-turnstile-response", default)]
    pub turnstile_response: Option<String>,
}

#[utoipa::path(
    post,
    path = "/auth/resend-verification",
    request_body(content = ResendForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 202, description = "Verification email requested", content_type = "text/html"),
        (status = 303, description = "No session, or the email is already verified"),
        (status = 400, description = "Turnstile token missing or rejected", body = String),
        (status = 429, description = "Resend cooldown active", body = String),
        (status = 502, description = "Auth API rejected the request", body = String),
        (status = 503, description = "Session still resolving or Turnstile unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    headers: HeaderMap,
    site: Extension<Arc<SiteState>>,
    form: Option<Form<ResendForm>>,
) -> Response {
    let snapshot = site.snapshot(&headers).await;
    if snapshot.is_loading {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [(RETRY_AFTER, "1")],
            "Session is still loading".to_string(),
        )
            .into_response();
    }

    let Some(user) = snapshot.user else {
        return Redirect::to(SIGN_IN_PATH).into_response();
    };

    if user.email_verified {
        return Redirect::to(LANDING_PATH).into_response();
    }

    if let Some(turnstile) = site.turnstile() {
        let response = form
            .as_ref()
            .and_then(|form| form.0.turnstile_response.as_deref());
        let client_ip = extract_client_ip(&headers);
        if let Err(err) = turnstile.verify(response, client_ip.as_deref()).await {
            let (status, message) = turnstile_error_response(&err);
            return (status, message).into_response();
        }
    }

    let limiter = site.resend_limiter();
    if limiter.check(&user.user_id) == RateLimitDecision::Limited {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    match site
        .sessions()
        .source()
        .resend_verification(&user.email)
        .await
    {
        Ok(()) => {
            info!(user_id = %user.user_id, "verification email requested");
            // The next request re-reads the session from the auth API.
            site.forget_session(&headers).await;
            (StatusCode::ACCEPTED, views::resend_sent()).into_response()
        }
        Err(err) => {
            error!("Failed to request verification email: {err:#}");
            limiter.release(&user.user_id);
            (
                StatusCode::BAD_GATEWAY,
                "Could not send verification email".to_string(),
            )
                .into_response()
        }
    }
}
