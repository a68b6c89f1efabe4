use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_TURNSTILE_SECRET: &str = "turnstile-secret";
pub const ARG_TURNSTILE_SITE_KEY: &str = "turnstile-site-key";
pub const ARG_CDN_BASE_URL: &str = "cdn-base-url";
pub const ARG_RESEND_COOLDOWN_SECONDS: &str = "resend-cooldown-seconds";

#[derive(Debug)]
pub struct Options {
    pub turnstile_secret: Option<SecretString>,
    pub turnstile_site_key: Option<String>,
    pub cdn_base_url: Option<Url>,
    pub resend_cooldown_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if the CDN base URL is invalid.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let cdn_base_url = matches
            .get_one::<String>(ARG_CDN_BASE_URL)
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid CDN base URL: {raw}")))
            .transpose()?;

        Ok(Self {
            turnstile_secret: matches
                .get_one::<String>(ARG_TURNSTILE_SECRET)
                .cloned()
                .map(SecretString::from),
            turnstile_site_key: matches.get_one::<String>(ARG_TURNSTILE_SITE_KEY).cloned(),
            cdn_base_url,
            resend_cooldown_seconds: matches
                .get_one::<u64>(ARG_RESEND_COOLDOWN_SECONDS)
                .copied()
                .unwrap_or(60),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TURNSTILE_SECRET)
                .long(ARG_TURNSTILE_SECRET)
                .help("Turnstile secret key; enables bot checks on verification resends")
                .env("STREAMLIFT_TURNSTILE_SECRET")
                .hide_env_values(true)
                .requires(ARG_TURNSTILE_SITE_KEY),
        )
        .arg(
            Arg::new(ARG_TURNSTILE_SITE_KEY)
                .long(ARG_TURNSTILE_SITE_KEY)
                .help("Turnstile site key rendered in the verification notice")
                .env("STREAMLIFT_TURNSTILE_SITE_KEY"),
        )
        .arg(
            Arg::new(ARG_CDN_BASE_URL)
                .long(ARG_CDN_BASE_URL)
                .help("CDN base URL for resized images, example: https://cdn.streamlift.tv")
                .env("STREAMLIFT_CDN_BASE_URL"),
        )
        .arg(
            Arg::new(ARG_RESEND_COOLDOWN_SECONDS)
                .long(ARG_RESEND_COOLDOWN_SECONDS)
                .help("Cooldown before a user can request another verification email")
                .env("STREAMLIFT_RESEND_COOLDOWN_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
}
