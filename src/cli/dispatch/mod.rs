//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action to run, resolving URLs and
//! durations up front so startup fails fast on bad configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{session, site};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let session_opts = session::Options::parse(matches)?;
    let site_opts = site::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        auth_api_url: session_opts.auth_api_url,
        auth_api_timeout: session_opts.auth_api_timeout,
        session_resolve_budget: session_opts.resolve_budget,
        session_cache_ttl: session_opts.cache_ttl,
        turnstile_secret: site_opts.turnstile_secret,
        turnstile_site_key: site_opts.turnstile_site_key,
        cdn_base_url: site_opts.cdn_base_url,
        resend_cooldown_seconds: site_opts.resend_cooldown_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_arguments_to_server_action() {
        temp_env::with_vars(
            [
                ("STREAMLIFT_TURNSTILE_SECRET", None::<&str>),
                ("STREAMLIFT_CDN_BASE_URL", None::<&str>),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec![
                    "streamlift",
                    "--auth-api-url",
                    "https://auth.streamlift.tv",
                    "--session-cache-seconds",
                    "45",
                ]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.auth_api_url.as_str(), "https://auth.streamlift.tv/");
                    assert_eq!(args.session_cache_ttl, Duration::from_secs(45));
                    assert_eq!(args.session_resolve_budget, Duration::from_millis(250));
                    assert!(args.turnstile_secret.is_none());
                    assert!(args.cdn_base_url.is_none());
                }
            },
        );
    }

    #[test]
    fn invalid_auth_api_url_is_rejected() {
        let matches = crate::cli::commands::new().get_matches_from(vec![
            "streamlift",
            "--auth-api-url",
            "not a url",
        ]);
        let result = handler(&matches);
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("invalid auth API URL"));
        }
    }

    #[test]
    fn invalid_cdn_url_is_rejected() {
        let matches = crate::cli::commands::new().get_matches_from(vec![
            "streamlift",
            "--auth-api-url",
            "https://auth.streamlift.tv",
            "--cdn-base-url",
            "::nope",
        ]);
        assert!(handler(&matches).is_err());
    }
}
