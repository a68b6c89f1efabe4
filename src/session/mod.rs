//! Session provider.
//!
//! Flow Overview: a request's session token is looked up in an in-memory
//! cache. Fresh entries answer immediately. Otherwise one background task per
//! token resolves it against the [`SessionSource`] while callers wait up to a
//! short budget; if the task is still running when the budget runs out the
//! caller gets [`SessionSnapshot::loading`] and is expected to poll again.
//!
//! Failed lookups resolve to an anonymous session and are never cached.

pub mod client;
pub mod token;

pub use client::AuthApiClient;
pub use token::{extract_session_token, SESSION_COOKIE_NAME};

use anyhow::Result;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    sync::{watch, Mutex},
    time::timeout,
};
use tracing::{debug, error};

use crate::gate::{SessionSnapshot, SessionUser};

pub type SessionFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<SessionUser>>> + Send + 'a>>;
pub type UnitFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Upstream that owns user sessions.
pub trait SessionSource: Send + Sync {
    /// Resolve a session token. `Ok(None)` means no active session.
    fn resolve<'a>(&'a self, token: &'a str) -> SessionFuture<'a>;

    /// Ask the upstream to send a fresh verification email.
    fn resend_verification<'a>(&'a self, email: &'a str) -> UnitFuture<'a>;
}

type Resolution = Option<Option<SessionUser>>;

enum Entry {
    Pending(watch::Receiver<Resolution>),
    Resolved {
        user: Option<SessionUser>,
        expires_at: Instant,
    },
}

/// Caching session provider in front of a [`SessionSource`].
pub struct SessionStore {
    source: Arc<dyn SessionSource>,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    cache_ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(source: Arc<dyn SessionSource>, cache_ttl: Duration) -> Self {
        Self {
            source,
            entries: Arc::new(Mutex::new(HashMap::new())),
            cache_ttl,
        }
    }

    #[must_use]
    pub fn source(&self) -> &Arc<dyn SessionSource> {
        &self.source
    }

    /// Snapshot the session for `token`, waiting at most `budget` for resolution.
    pub async fn snapshot(&self, token: Option<&str>, budget: Duration) -> SessionSnapshot {
        let Some(token) = token else {
            return SessionSnapshot::anonymous();
        };

        let mut receiver = {
            let mut entries = self.entries.lock().await;
            let pending = match entries.get(token) {
                Some(Entry::Resolved { user, expires_at }) if *expires_at > Instant::now() => {
                    return SessionSnapshot::resolved(user.clone());
                }
                Some(Entry::Pending(receiver)) if is_open(receiver) => Some(receiver.clone()),
                _ => None,
            };
            match pending {
                Some(receiver) => receiver,
                None => self.spawn_resolution(&mut entries, token),
            }
        };

        let waited = timeout(budget, async {
            receiver
                .wait_for(Option::is_some)
                .await
                .map(|resolution| resolution.clone().flatten())
        })
        .await;

        match waited {
            Ok(Ok(user)) => SessionSnapshot::resolved(user),
            Ok(Err(_)) => {
                error!("Session resolution ended without a result");
                self.entries.lock().await.retain(|_, entry| match entry {
                    Entry::Pending(receiver) => is_open(receiver),
                    Entry::Resolved { .. } => true,
                });
                SessionSnapshot::anonymous()
            }
            Err(_) => {
                debug!("session resolution still in flight");
                SessionSnapshot::loading()
            }
        }
    }

    /// Forget any cached or in-flight resolution for `token`.
    pub async fn invalidate(&self, token: &str) {
        self.entries.lock().await.remove(token);
    }

    fn spawn_resolution(
        &self,
        entries: &mut HashMap<String, Entry>,
        token: &str,
    ) -> watch::Receiver<Resolution> {
        let now = Instant::now();
        entries.retain(|_, entry| match entry {
            Entry::Resolved { expires_at, .. } => *expires_at > now,
            Entry::Pending(receiver) => is_open(receiver),
        });

        let (sender, receiver) = watch::channel(None);
        entries.insert(token.to_string(), Entry::Pending(receiver.clone()));

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.entries);
        let cache_ttl = self.cache_ttl;
        let token = token.to_string();

        tokio::spawn(async move {
            let outcome = source.resolve(&token).await;
            let user = {
                let mut entries = shared.lock().await;
                match outcome {
                    Ok(user) => {
                        entries.insert(
                            token,
                            Entry::Resolved {
                                user: user.clone(),
                                expires_at: Instant::now() + cache_ttl,
                            },
                        );
                        user
                    }
                    Err(err) => {
                        error!("Failed to resolve session: {err:#}");
                        entries.remove(&token);
                        None
                    }
                }
            };
            let _ = sender.send(Some(user));
        });

        receiver
    }
}

/// A pending entry whose resolver went away without sending is dead.
fn is_open(receiver: &watch::Receiver<Resolution>) -> bool {
    receiver.has_changed().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Role;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct FakeSource {
        calls: AtomicUsize,
        release: Notify,
        hold: bool,
        fail: bool,
    }

    impl FakeSource {
        fn new(hold: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
                hold,
                fail,
            })
        }
    }

    impl SessionSource for FakeSource {
        fn resolve<'a>(&'a self, token: &'a str) -> SessionFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                assert_ne!(token, "crash", "resolver crashed");
                if self.hold {
                    self.release.notified().await;
                }
                if self.fail {
                    return Err(anyhow!("auth API unavailable"));
                }
                Ok((token == "valid").then(|| SessionUser {
                    user_id: "user-1".to_string(),
                    email: "streamer@example.com".to_string(),
                    email_verified: true,
                    role: Role::Member,
                }))
            })
        }

        fn resend_verification<'a>(&'a self, _email: &'a str) -> UnitFuture<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn missing_token_is_anonymous_without_lookup() {
        let source = FakeSource::new(false, false);
        let store = SessionStore::new(source.clone(), Duration::from_secs(30));
        assert_eq!(store.snapshot(None, WAIT).await, SessionSnapshot::anonymous());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolved_sessions_are_cached() {
        let source = FakeSource::new(false, false);
        let store = SessionStore::new(source.clone(), Duration::from_secs(30));

        let first = store.snapshot(Some("valid"), WAIT).await;
        assert!(!first.is_loading);
        assert_eq!(first.user.map(|user| user.user_id), Some("user-1".to_string()));

        let second = store.snapshot(Some("valid"), WAIT).await;
        assert!(second.user.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_token_is_anonymous() {
        let source = FakeSource::new(false, false);
        let store = SessionStore::new(source, Duration::from_secs(30));
        assert_eq!(
            store.snapshot(Some("stale"), WAIT).await,
            SessionSnapshot::anonymous()
        );
    }

    #[tokio::test]
    async fn slow_resolution_reports_loading_then_settles() {
        let source = FakeSource::new(true, false);
        let store = SessionStore::new(source.clone(), Duration::from_secs(30));

        let pending = store
            .snapshot(Some("valid"), Duration::from_millis(20))
            .await;
        assert_eq!(pending, SessionSnapshot::loading());

        let again = store
            .snapshot(Some("valid"), Duration::from_millis(20))
            .await;
        assert_eq!(again, SessionSnapshot::loading());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        source.release.notify_one();
        let settled = store.snapshot(Some("valid"), WAIT).await;
        assert!(!settled.is_loading);
        assert!(settled.user.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_anonymous_and_not_cached() {
        let source = FakeSource::new(false, true);
        let store = SessionStore::new(source.clone(), Duration::from_secs(30));

        assert_eq!(
            store.snapshot(Some("valid"), WAIT).await,
            SessionSnapshot::anonymous()
        );
        assert_eq!(
            store.snapshot(Some("valid"), WAIT).await,
            SessionSnapshot::anonymous()
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn crashed_resolution_is_retried() {
        let source = FakeSource::new(false, false);
        let store = SessionStore::new(source.clone(), Duration::from_secs(30));

        assert_eq!(
            store.snapshot(Some("crash"), WAIT).await,
            SessionSnapshot::anonymous()
        );
        assert_eq!(
            store.snapshot(Some("crash"), WAIT).await,
            SessionSnapshot::anonymous()
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(store.entries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn invalidate_forces_a_fresh_lookup() {
        let source = FakeSource::new(false, false);
        let store = SessionStore::new(source.clone(), Duration::from_secs(30));

        assert!(store.snapshot(Some("valid"), WAIT).await.user.is_some());
        store.invalidate("valid").await;
        assert!(store.snapshot(Some("valid"), WAIT).await.user.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refreshed() {
        let source = FakeSource::new(false, false);
        let store = SessionStore::new(source.clone(), Duration::ZERO);

        assert!(store.snapshot(Some("valid"), WAIT).await.user.is_some());
        assert!(store.snapshot(Some("valid"), WAIT).await.user.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
