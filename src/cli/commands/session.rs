use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::time::Duration;
use url::Url;

pub const ARG_AUTH_API_URL: &str = "auth-api-url";
pub const ARG_AUTH_API_TIMEOUT_SECONDS: &str = "auth-api-timeout-seconds";
pub const ARG_SESSION_RESOLVE_BUDGET_MS: &str = "session-resolve-budget-ms";
pub const ARG_SESSION_CACHE_SECONDS: &str = "session-cache-seconds";

#[derive(Debug)]
pub struct Options {
    pub auth_api_url: Url,
    pub auth_api_timeout: Duration,
    pub resolve_budget: Duration,
    pub cache_ttl: Duration,
}

impl Options {
    /// # Errors
    /// Returns an error if the auth API URL is missing or invalid.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let raw_url = matches
            .get_one::<String>(ARG_AUTH_API_URL)
            .context("missing required argument: --auth-api-url")?;
        let auth_api_url =
            Url::parse(raw_url).with_context(|| format!("invalid auth API URL: {raw_url}"))?;

        let seconds = |name: &str, default: u64| {
            Duration::from_secs(matches.get_one::<u64>(name).copied().unwrap_or(default))
        };

        Ok(Self {
            auth_api_url,
            auth_api_timeout: seconds(ARG_AUTH_API_TIMEOUT_SECONDS, 5),
            resolve_budget: Duration::from_millis(
                matches
                    .get_one::<u64>(ARG_SESSION_RESOLVE_BUDGET_MS)
                    .copied()
                    .unwrap_or(250),
            ),
            cache_ttl: seconds(ARG_SESSION_CACHE_SECONDS, 30),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_API_URL)
                .long(ARG_AUTH_API_URL)
                .help("Auth API base URL, example: https://auth.streamlift.tv")
                .env("STREAMLIFT_AUTH_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_AUTH_API_TIMEOUT_SECONDS)
                .long(ARG_AUTH_API_TIMEOUT_SECONDS)
                .help("Timeout for auth API requests in seconds")
                .env("STREAMLIFT_AUTH_API_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_RESOLVE_BUDGET_MS)
                .long(ARG_SESSION_RESOLVE_BUDGET_MS)
                .help("How long a request waits for session resolution before rendering the loading page")
                .env("STREAMLIFT_SESSION_RESOLVE_BUDGET_MS")
                .default_value("250")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_CACHE_SECONDS)
                .long(ARG_SESSION_CACHE_SECONDS)
                .help("How long a resolved session is reused")
                .env("STREAMLIFT_SESSION_CACHE_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64)),
        )
}
