//! Session token extraction from request headers.

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use secrecy::SecretString;

pub const SESSION_COOKIE_NAME: &str = "streamlift_session";

/// Read the caller's session token. A bearer header takes precedence over the cookie.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<SecretString> {
    extract_bearer_token(headers)
        .or_else(|| extract_cookie_token(headers))
        .map(SecretString::from)
}

fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        let val = val.trim();
        (key.trim() == SESSION_COOKIE_NAME && !val.is_empty()).then(|| val.to_string())
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
