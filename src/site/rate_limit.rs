//! Rate limiting primitives for the verification resend action.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    /// Check and record an attempt for `key`.
    fn check(&self, key: &str) -> RateLimitDecision;

    /// Forget the last recorded attempt for `key`, e.g. when it never reached the user.
    fn release(&self, key: &str);
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _key: &str) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn release(&self, _key: &str) {}
}

/// Allows one attempt per key within `window`.
#[derive(Debug)]
pub struct ResendCooldown {
    window: Duration,
    last_attempt: Mutex<HashMap<String, Instant>>,
}

impl ResendCooldown {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_attempt: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for ResendCooldown {
    fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut last_attempt = self
            .last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        last_attempt.retain(|_, at| now.duration_since(*at) < self.window);

        if last_attempt.contains_key(key) {
            return RateLimitDecision::Limited;
        }
        last_attempt.insert(key.to_string(), now);
        RateLimitDecision::Allowed
    }

    fn release(&self, key: &str) {
        self.last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Limiter for a cooldown of `seconds`; zero disables limiting.
#[must_use]
pub fn resend_limiter(seconds: u64) -> Arc<dyn RateLimiter> {
    if seconds == 0 {
        Arc::new(NoopRateLimiter)
    } else {
        Arc::new(ResendCooldown::new(Duration::from_secs(seconds)))
    }
}
