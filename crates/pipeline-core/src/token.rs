//! Bearer token caching with a near-expiry safety buffer.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

/// Seconds subtracted from the issued lifetime so a cached token is never
/// raced against server-side expiry.
const SAFETY_BUFFER_SECS: i64 = 300;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Per-platform cache for one bearer token and its effective expiry.
///
/// Clients call [`TokenCache::current`] before each request and only perform
/// a network exchange when it returns `None`. The stored expiry is the issued
/// lifetime minus a five-minute buffer.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if its buffered expiry has not passed.
    pub async fn current(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|token| token.expires_at > Utc::now())
            .map(|token| token.value.clone())
    }

    /// Cache a freshly issued token for `expires_in_secs` minus the buffer.
    pub async fn store(&self, value: String, expires_in_secs: i64) {
        let expires_at = Utc::now() + Duration::seconds(expires_in_secs - SAFETY_BUFFER_SECS);
        let mut slot = self.slot.write().await;
        *slot = Some(CachedToken { value, expires_at });
    }

    /// Drop the cached token, forcing a refresh on the next request.
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }
}
