// Access-token cache
//
// Holds at most one platform access token and its expiry instant. Reads of
// a valid token share a read lock; refreshes are serialised behind a single
// async mutex so concurrent callers wait on one in-flight fetch instead of
// each issuing their own. Callers that queued behind a fetch take its
// outcome, failure included.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::Error;

/// Default margin subtracted from a token's lifetime.
pub const DEFAULT_SAFETY_MARGIN: TimeDelta = TimeDelta::seconds(60);

/// `result` payload of `GET /v1.0/token?grant_type=1`.
#[derive(Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expire_time: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("expire_time", &self.expire_time)
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

/// A cached platform access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
    refresh_token: Option<SecretString>,
    uid: Option<String>,
}

impl AccessToken {
    pub fn new(value: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            expires_at,
            refresh_token: None,
            uid: None,
        }
    }

    /// Build from a grant received at `issued_at`.
    ///
    /// A lifetime that does not fit a timestamp is a malformed response.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Result<Self, Error> {
        let expires_at = TimeDelta::try_seconds(grant.expire_time)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| Error::Authentication {
                message: format!(
                    "malformed token response: expire_time {} is out of range",
                    grant.expire_time
                ),
            })?;

        Ok(Self {
            value: SecretString::from(grant.access_token),
            expires_at,
            refresh_token: grant.refresh_token.map(SecretString::from),
            uid: grant.uid,
        })
    }

    pub fn value(&self) -> &SecretString {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Usable only while `now < expires_at - margin`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        now < self.expires_at - margin
    }
}

/// Process-wide holder of the current access token.
///
/// Owned by the dispatcher (usually behind an `Arc`), never a global.
pub struct TokenCache {
    slot: RwLock<Option<AccessToken>>,
    /// Guards fetches; holds the message of the last failed one.
    refresh: Mutex<Option<String>>,
    /// Bumped each time a fetch completes.
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
    margin: TimeDelta,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("margin", &self.margin)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_SAFETY_MARGIN)
    }
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>, margin: TimeDelta) -> Self {
        Self {
            slot: RwLock::new(None),
            refresh: Mutex::new(None),
            generation: AtomicU64::new(0),
            clock,
            margin,
        }
    }

    /// The clock this cache measures expiry against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn margin(&self) -> TimeDelta {
        self.margin
    }

    /// The cached token if it is still usable right now.
    pub async fn current(&self) -> Option<AccessToken> {
        let now = self.clock.now();
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now, self.margin))
            .cloned()
    }

    /// Return a usable token, calling `fetch` if the cache is empty or stale.
    ///
    /// At most one `fetch` runs at a time. Callers that arrive while a fetch
    /// is in flight wait for it and then reuse its result: the token on
    /// success, an [`Error::Authentication`] carrying the same message on
    /// failure. A failed fetch caches no token and is never retried here.
    pub async fn get_valid_token<F, Fut>(&self, fetch: F) -> Result<SecretString, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenGrant, Error>>,
    {
        if let Some(token) = self.current().await {
            return Ok(token.value);
        }

        // Any fetch that completes after this read answers for us as well.
        let seen = self.generation.load(Ordering::Acquire);
        let mut last_failure = self.refresh.lock().await;

        if let Some(token) = self.current().await {
            debug!("token refreshed by concurrent caller");
            return Ok(token.value);
        }
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(message) = last_failure.clone() {
                debug!("concurrent token refresh failed; sharing its error");
                return Err(Error::Authentication { message });
            }
        }

        // Expired tokens are dropped before fetching so they can never be
        // handed out again, even if the fetch fails.
        self.slot.write().await.take();

        let issued_at = self.clock.now();
        let outcome = fetch()
            .await
            .and_then(|grant| AccessToken::from_grant(grant, issued_at));
        self.generation.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(token) => {
                *last_failure = None;
                let value = token.value.clone();
                let expires_at = token.expires_at;
                *self.slot.write().await = Some(token);
                info!(%expires_at, "obtained new access token");
                Ok(value)
            }
            Err(err) => {
                *last_failure = Some(match err {
                    Error::Authentication { ref message } => message.clone(),
                    ref other => other.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        if self.slot.write().await.take().is_some() {
            debug!("access token invalidated");
        }
    }

    /// Whether a usable token is cached (does not fetch).
    pub async fn has_valid_token(&self) -> bool {
        self.current().await.is_some()
    }

    /// Expose the raw token value of the cached entry, if any is valid.
    pub async fn peek(&self) -> Option<String> {
        self.current()
            .await
            .map(|token| token.value.expose_secret().to_owned())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clock::ManualClock;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn grant(token: &str, secs: i64) -> TokenGrant {
        TokenGrant {
            access_token: token.into(),
            expire_time: secs,
            refresh_token: Some("refresh".into()),
            uid: Some("uid-1".into()),
        }
    }

    fn cache(clock: &Arc<ManualClock>) -> TokenCache {
        TokenCache::new(clock.clone(), DEFAULT_SAFETY_MARGIN)
    }

    #[test]
    fn validity_respects_margin() {
        let token = AccessToken::new(
            SecretString::from("t".to_owned()),
            start() + TimeDelta::seconds(7200),
        );
        let margin = TimeDelta::seconds(60);
        assert!(token.is_valid_at(start(), margin));
        assert!(token.is_valid_at(start() + TimeDelta::seconds(7139), margin));
        assert!(!token.is_valid_at(start() + TimeDelta::seconds(7140), margin));
        assert!(!token.is_valid_at(start() + TimeDelta::seconds(7200), margin));
    }

    #[tokio::test]
    async fn fetches_once_then_serves_from_cache() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token = cache
                .get_valid_token(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(grant("tok-1", 7200))
                })
                .await
                .unwrap();
            assert_eq!(token.expose_secret(), "tok-1");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refetches_after_margin_passes() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        let fetch = |name: &'static str| {
            let calls = &calls;
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(grant(name, 7200))
            }
        };

        cache.get_valid_token(fetch("tok-1")).await.unwrap();
        clock.advance(TimeDelta::seconds(7139));
        let still = cache.get_valid_token(fetch("tok-2")).await.unwrap();
        assert_eq!(still.expose_secret(), "tok-1");

        clock.advance(TimeDelta::seconds(1));
        let fresh = cache.get_valid_token(fetch("tok-2")).await.unwrap();
        assert_eq!(fresh.expose_secret(), "tok-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_caches_nothing_and_drops_stale_token() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(&clock);
        cache
            .get_valid_token(|| async { Ok(grant("tok-1", 120)) })
            .await
            .unwrap();

        clock.advance(TimeDelta::seconds(61));
        let err = cache
            .get_valid_token(|| async {
                Err(Error::Authentication {
                    message: "boom".into(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
        assert!(!cache.has_valid_token().await);

        // Rewinding the clock must not resurrect the discarded token.
        clock.set(start());
        assert!(cache.peek().await.is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(&clock);
        cache
            .get_valid_token(|| async { Ok(grant("tok-1", 7200)) })
            .await
            .unwrap();
        cache.invalidate().await;
        let token = cache
            .get_valid_token(|| async { Ok(grant("tok-2", 7200)) })
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "tok-2");
    }

    #[tokio::test]
    async fn grant_metadata_is_kept() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(&clock);
        cache
            .get_valid_token(|| async { Ok(grant("tok-1", 7200)) })
            .await
            .unwrap();
        let token = cache.current().await.unwrap();
        assert_eq!(token.uid(), Some("uid-1"));
        assert!(token.refresh_token().is_some());
        assert_eq!(token.expires_at(), start() + TimeDelta::seconds(7200));
    }

    #[test]
    fn out_of_range_lifetime_is_rejected() {
        for secs in [i64::MAX, i64::MIN, 10_000_000_000_000] {
            let err = AccessToken::from_grant(grant("t", secs), start()).unwrap_err();
            assert!(matches!(err, Error::Authentication { .. }), "{secs}");
            assert!(err.to_string().contains("malformed token response"));
        }
    }

    #[tokio::test]
    async fn queued_callers_share_a_failed_fetch() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        let attempt = || {
            cache.get_valid_token(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Err(Error::Authentication {
                    message: "sign invalid".into(),
                })
            })
        };
        let results = futures::future::join_all((0..8).map(|_| attempt())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            let err = result.unwrap_err();
            assert_eq!(err.to_string(), "Authentication failed: sign invalid");
        }

        // A later call is a fresh attempt, not a replay.
        let token = cache
            .get_valid_token(|| async { Ok(grant("tok-1", 7200)) })
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "tok-1");
    }
}
