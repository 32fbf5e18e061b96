use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Carrier bearer token with its local expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Single-flight cache for the carrier's bearer token.
///
/// The slot lock is held across a refresh, so concurrent callers that find
/// the token stale queue behind the one refreshing it and then reuse its
/// result instead of authenticating again.
pub struct TokenCache {
    ttl: Duration,
    margin: Duration,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(ttl: Duration, margin: Duration) -> Self {
        Self {
            ttl,
            margin,
            slot: Mutex::new(None),
        }
    }

    /// Cached token if it is still valid past the safety margin, otherwise the
    /// result of `refresh`, which is then cached.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.as_ref() {
            if Instant::now() + self.margin < token.expires_at {
                return Ok(token.value.clone());
            }
            tracing::debug!("Carrier token within expiry margin, refreshing");
        }

        let value = refresh().await?;
        *slot = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        Ok(value)
    }

    /// Drop `stale` if it is still the cached token. A token another caller
    /// already replaced is left alone.
    pub async fn invalidate(&self, stale: &str) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|token| token.value == stale) {
            *slot = None;
        }
    }
}
