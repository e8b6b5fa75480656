// Token lifecycle: decoding the claims embedded in access tokens and keeping
// a token pair fresh. A refresh is single-flight per `TokenManager`: callers
// that show up while one is running wait on that same call instead of
// issuing their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Access/refresh token pair as issued by `POST /auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    exp: Option<i64>,
    token_id: Option<String>,
}

fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    // Some issuers pad the segments, JWT says they must not. Accept both.
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Expiry of a JWT in seconds since the epoch.
pub fn expires_at(token: &str) -> Option<i64> {
    decode_claims(token)?.exp
}

/// A token whose expiry can't be read counts as expired.
pub fn is_expired(token: &str) -> bool {
    match expires_at(token) {
        Some(exp) => exp <= Utc::now().timestamp(),
        None => true,
    }
}

/// The server-side id of a token, needed to revoke it.
pub fn token_id(token: &str) -> Option<String> {
    decode_claims(token)?.token_id
}

/// Performs the actual network refresh.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthToken, ApiError>;
}

type PendingRefresh = Shared<BoxFuture<'static, Result<AuthToken, ApiError>>>;

struct InFlight {
    id: u64,
    refresh_token: String,
    pending: PendingRefresh,
}

#[derive(Default)]
struct RefreshState {
    in_flight: Option<InFlight>,
    /// The refresh token last exchanged successfully and the pair it bought.
    last: Option<(String, AuthToken)>,
}

/// Keeps access tokens valid, refreshing at most once at a time.
pub struct TokenManager {
    refresher: Arc<dyn TokenRefresher>,
    state: Mutex<RefreshState>,
    next_id: AtomicU64,
}

impl TokenManager {
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        TokenManager {
            refresher,
            state: Mutex::new(RefreshState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns `token` untouched while its access token is valid, a refreshed
    /// pair once it has expired, or `None` when no valid token can be had.
    pub async fn check(&self, token: &AuthToken) -> Option<AuthToken> {
        if !is_expired(&token.access_token) {
            return Some(token.clone());
        }
        if is_expired(&token.refresh_token) {
            tracing::info!("access and refresh tokens expired; re-authentication required");
            return None;
        }
        match self.refresh(&token.refresh_token).await {
            Ok(fresh) => Some(fresh),
            Err(err) => {
                tracing::warn!("token refresh failed: {err}");
                None
            }
        }
    }

    /// Exchanges `refresh_token` for a new pair. Concurrent callers share the
    /// pending call and all receive its result.
    ///
    /// A caller that shows up just after a refresh settled, still holding the
    /// refresh token that was exchanged, gets that refresh's pair back while
    /// its access token is valid. The server may already have rotated the old
    /// refresh token out.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthToken, ApiError> {
        let (id, used, pending) = {
            let mut state = self.state.lock();
            if let Some(flight) = &state.in_flight {
                (flight.id, flight.refresh_token.clone(), flight.pending.clone())
            } else {
                if let Some((exchanged, fresh)) = &state.last {
                    if exchanged == refresh_token && !is_expired(&fresh.access_token) {
                        tracing::debug!("refresh token already exchanged, reusing its pair");
                        return Ok(fresh.clone());
                    }
                }
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let refresher = Arc::clone(&self.refresher);
                let token = refresh_token.to_string();
                tracing::debug!(refresh = id, "starting token refresh");
                let pending = async move { refresher.refresh(&token).await }
                    .boxed()
                    .shared();
                state.in_flight = Some(InFlight {
                    id,
                    refresh_token: refresh_token.to_string(),
                    pending: pending.clone(),
                });
                (id, refresh_token.to_string(), pending)
            }
        };

        let result = pending.await;

        // The slot is never observed empty before the result is recorded.
        let mut state = self.state.lock();
        if matches!(&state.in_flight, Some(flight) if flight.id == id) {
            state.in_flight = None;
            if let Ok(fresh) = &result {
                state.last = Some((used, fresh.clone()));
            }
        }
        result
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn jwt(claims: serde_json::Value) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn token_expiring_in(secs: i64) -> String {
        jwt(serde_json::json!({ "exp": Utc::now().timestamp() + secs, "token_id": "tok-1" }))
    }

    struct CountingRefresher {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingRefresher {
        fn new(delay_ms: u64) -> Arc<Self> {
            Arc::new(CountingRefresher {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(delay_ms),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(CountingRefresher {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(5),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<AuthToken, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ApiError::network());
            }
            Ok(AuthToken {
                access_token: jwt(serde_json::json!({
                    "exp": Utc::now().timestamp() + 900,
                    "n": n
                })),
                refresh_token: token_expiring_in(86_400),
            })
        }
    }

    #[test]
    fn reads_expiry_and_token_id() {
        let token = jwt(serde_json::json!({ "exp": 1_700_000_000, "token_id": "abc" }));
        assert_eq!(expires_at(&token), Some(1_700_000_000));
        assert_eq!(token_id(&token).as_deref(), Some("abc"));
        assert!(is_expired(&token));
    }

    #[test]
    fn undecodable_tokens_are_expired() {
        assert!(is_expired("not-a-jwt"));
        assert!(is_expired("a.%%%.c"));
        assert!(is_expired(&jwt(serde_json::json!({ "sub": "no-exp" }))));
        assert!(!is_expired(&token_expiring_in(60)));
    }

    #[tokio::test]
    async fn valid_token_is_returned_unchanged() {
        let refresher = CountingRefresher::new(0);
        let manager = TokenManager::new(refresher.clone());
        let token = AuthToken {
            access_token: token_expiring_in(300),
            refresh_token: token_expiring_in(3_600),
        };

        assert_eq!(manager.check(&token).await, Some(token));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_is_never_returned_unchanged() {
        let manager = TokenManager::new(CountingRefresher::new(0));
        let token = AuthToken {
            access_token: token_expiring_in(-1),
            refresh_token: token_expiring_in(3_600),
        };

        let checked = manager.check(&token).await.expect("refreshed token");
        assert_ne!(checked, token);
        assert!(!is_expired(&checked.access_token));
    }

    #[tokio::test]
    async fn garbage_access_token_forces_refresh() {
        let refresher = CountingRefresher::new(0);
        let manager = TokenManager::new(refresher.clone());
        let token = AuthToken {
            access_token: "garbage".into(),
            refresh_token: token_expiring_in(3_600),
        };

        assert!(manager.check(&token).await.is_some());
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_expired_yields_none_without_network() {
        let refresher = CountingRefresher::new(0);
        let manager = TokenManager::new(refresher.clone());
        let token = AuthToken {
            access_token: token_expiring_in(-10),
            refresh_token: token_expiring_in(-5),
        };

        assert_eq!(manager.check(&token).await, None);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_yields_none() {
        let manager = TokenManager::new(CountingRefresher::failing());
        let token = AuthToken {
            access_token: token_expiring_in(-10),
            refresh_token: token_expiring_in(3_600),
        };

        assert_eq!(manager.check(&token).await, None);
        assert!(!manager.is_refreshing());
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_call() {
        let refresher = CountingRefresher::new(50);
        let manager = Arc::new(TokenManager::new(refresher.clone()));

        let calls = (0..8).map(|_| {
            let manager = Arc::clone(&manager);
            async move { manager.refresh("refresh").await }
        });
        let results = futures_util::future::join_all(calls).await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        let first = results[0].clone().expect("refresh ok");
        assert!(results.iter().all(|r| r.as_ref() == Ok(&first)));
        assert!(!manager.is_refreshing());
    }

    #[tokio::test]
    async fn settled_refresh_allows_a_new_one() {
        let refresher = CountingRefresher::new(1);
        let manager = TokenManager::new(refresher.clone());

        let a = manager.refresh("r1").await.expect("first refresh");
        let b = manager.refresh("r2").await.expect("second refresh");

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn failed_refresh_clears_in_flight_marker() {
        let refresher = CountingRefresher::failing();
        let manager = TokenManager::new(refresher.clone());

        assert!(manager.refresh("r").await.is_err());
        assert!(manager.refresh("r").await.is_err());
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exchanged_refresh_token_reuses_the_settled_pair() {
        let refresher = CountingRefresher::new(1);
        let manager = TokenManager::new(refresher.clone());
        let stale = AuthToken {
            access_token: token_expiring_in(-1),
            refresh_token: token_expiring_in(3_600),
        };

        let first = manager.check(&stale).await.expect("refreshed");
        // A second caller read the stale pair before the first one stored
        // the refreshed pair.
        let second = manager.check(&stale).await.expect("reused");

        assert_eq!(first, second);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(!manager.is_refreshing());
    }
}
