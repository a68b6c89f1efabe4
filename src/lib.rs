//! # Streamlift
//!
//! `streamlift` serves the Twitch viewer growth site: a public marketing home
//! page plus a customer dashboard, an admin panel and a per-package checkout
//! page that sit behind an access gate.
//!
//! ## Access gate
//!
//! Every request to a protected route is answered by exactly one decision,
//! evaluated in order:
//!
//! 1. **Loading** while the session is still resolving (placeholder page that refreshes).
//! 2. **Unauthenticated** when there is no session (redirect to `/auth`).
//! 3. **Unverified** when the email is not verified and the user is not an admin
//!    (blocking notice with a single "resend verification" action).
//! 4. **Unauthorized** when the route is admin-only and the user is not an admin
//!    (silent redirect to `/dashboard`).
//! 5. **Granted** otherwise; the view runs with its original path parameters.
//!
//! The decision is a pure function of the session snapshot and the route
//! declaration (see [`gate::evaluate`]).
//!
//! ## Sessions
//!
//! Sessions are owned by an external auth API. [`session::SessionStore`]
//! resolves `streamlift_session` cookies (or bearer tokens) against it, caches
//! the result briefly, and reports in-flight lookups as loading.

pub mod cli;
pub mod gate;
pub mod session;
pub mod site;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
