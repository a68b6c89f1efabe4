//! Minimal HTML views. Styling lives in the static frontend, not here.

use axum::{
    http::{
        header::CACHE_CONTROL,
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use url::Url;

use super::{cdn, packages::Package, turnstile::TURNSTILE_FIELD};
use crate::gate::SessionUser;

const REFRESH: HeaderName = HeaderName::from_static("refresh");
const TURNSTILE_SCRIPT: &str = "https://challenges.cloudflare.com/turnstile/v0/api.js";

pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{} | Streamlift</title></head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    ))
}

/// Placeholder shown while the session resolves; the browser re-requests `target`.
pub fn loading(target: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(refresh) = HeaderValue::from_str(&format!("1; url={target}")) {
        headers.insert(REFRESH, refresh);
    }
    let body = format!(
        "<main data-state=\"loading\" data-path=\"{}\"><p>Checking your session&hellip;</p></main>",
        escape(target)
    );
    (StatusCode::OK, headers, page("Loading", &body)).into_response()
}

/// Blocking notice for accounts that still need to verify their email.
pub fn verification_notice(user: &SessionUser, turnstile_site_key: Option<&str>) -> Response {
    let widget = turnstile_site_key.map_or_else(String::new, |key| {
        format!(
            "<script src=\"{TURNSTILE_SCRIPT}\" async defer></script><div class=\"cf-turnstile\" data-sitekey=\"{}\" data-response-field-name=\"{TURNSTILE_FIELD}\"></div>",
            escape(key)
        )
    });
    let body = format!(
        "<main data-state=\"verify-email\">\
         <h1>Verify your email</h1>\
         <p>We sent a verification link to <strong>{}</strong>. Open it to unlock your dashboard.</p>\
         <form method=\"post\" action=\"/auth/resend-verification\">{widget}\
         <button type=\"submit\">Resend verification email</button></form></main>",
        escape(&user.email)
    );
    (
        StatusCode::FORBIDDEN,
        [(CACHE_CONTROL, "no-store")],
        page("Verify your email", &body),
    )
        .into_response()
}

pub fn resend_sent() -> Html<String> {
    page(
        "Check your inbox",
        "<main data-state=\"resend-sent\"><p>A new verification link is on the way.</p></main>",
    )
}

pub fn home(cdn_base_url: Option<&Url>, packages: &[Package]) -> Html<String> {
    let pricing: String = packages
        .iter()
        .map(|package| {
            format!(
                "<li data-package=\"{id}\"><h3>{name}</h3><p>{viewers} viewers</p><p>{price}</p><a href=\"/checkout/{id}\">Get started</a></li>",
                id = escape(package.id),
                name = escape(package.name),
                viewers = package.viewers,
                price = package.price_label(),
            )
        })
        .collect();
    let body = format!(
        "<section id=\"hero\"><img src=\"{hero}\" alt=\"Live stream\"><h1>Grow your Twitch audience</h1><a href=\"/auth\">Start now</a></section>\
         <section id=\"pricing\"><ul>{pricing}</ul></section>\
         <section id=\"faq\"><h2>FAQ</h2><dl><dt>How fast does it start?</dt><dd>Within minutes of going live.</dd></dl></section>\
         <section id=\"testimonials\"><h2>What streamers say</h2><blockquote>My chat finally feels alive.</blockquote></section>",
        hero = escape(&cdn::image_url(cdn_base_url, "img/hero.jpg", 1280)),
    );
    page("Twitch viewer growth", &body)
}

pub fn sign_in() -> Html<String> {
    page(
        "Sign in",
        "<main data-state=\"sign-in\"><h1>Sign in</h1><p>Sign in with your Streamlift account to continue.</p></main>",
    )
}

pub fn dashboard(user: &SessionUser) -> Html<String> {
    let body = format!(
        "<main data-view=\"dashboard\"><h1>Dashboard</h1><p>Signed in as {}</p></main>",
        escape(&user.email)
    );
    page("Dashboard", &body)
}

pub fn admin(user: &SessionUser) -> Html<String> {
    let body = format!(
        "<main data-view=\"admin\"><h1>Admin</h1><p>Operator {}</p></main>",
        escape(&user.email)
    );
    page("Admin", &body)
}

pub fn checkout(package_id: &str, package: Option<&Package>) -> Html<String> {
    let summary = package.map_or_else(
        || "<p>Unknown package</p>".to_string(),
        |package| {
            format!(
                "<p>{} &middot; {} viewers &middot; {}</p>",
                escape(package.name),
                package.viewers,
                package.price_label()
            )
        },
    );
    let body = format!(
        "<main data-view=\"checkout\" data-package-id=\"{}\"><h1>Checkout</h1>{summary}</main>",
        escape(package_id)
    );
    page("Checkout", &body)
}
