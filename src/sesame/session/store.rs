//! Session persistence. Stores are keyed by the hashed cookie token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Everything a session remembers between requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionData {
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub flash: Option<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session. Expired or unknown tokens yield `None`.
    async fn load(&self, token_hash: &[u8]) -> Result<Option<SessionData>>;

    /// Create or replace a session, extending its expiry by `ttl`.
    async fn save(&self, token_hash: &[u8], data: &SessionData, ttl: Duration) -> Result<()>;

    /// Remove a session. Unknown tokens are not an error.
    async fn destroy(&self, token_hash: &[u8]) -> Result<()>;

    /// Delete every expired session, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<u64>;
}

struct MemoryEntry {
    data: SessionData,
    expires_at: Instant,
}

/// Process-local sessions; lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<Vec<u8>, MemoryEntry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held, expired ones included until next write.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token_hash: &[u8]) -> Result<Option<SessionData>> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get(token_hash) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.data.clone())),
            Some(_) => {
                entries.remove(token_hash);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token_hash: &[u8], data: &SessionData, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .context("session ttl out of range")?;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            token_hash.to_vec(),
            MemoryEntry {
                data: data.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn destroy(&self, token_hash: &[u8]) -> Result<()> {
        self.entries.lock().await.remove(token_hash);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signed_in() -> SessionData {
        SessionData {
            username: Some("abc".to_string()),
            user_id: Some("42".to_string()),
            flash: None,
        }
    }

    #[tokio::test]
    async fn save_then_load_returns_data() {
        let store = MemorySessionStore::new();
        store
            .save(b"hash", &signed_in(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.load(b"hash").await.unwrap(), Some(signed_in()));
        assert_eq!(store.load(b"other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_sessions_are_not_loaded() {
        let store = MemorySessionStore::new();
        store.save(b"hash", &signed_in(), Duration::ZERO).await.unwrap();
        assert_eq!(store.load(b"hash").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn destroy_removes_session() {
        let store = MemorySessionStore::new();
        store
            .save(b"hash", &signed_in(), Duration::from_secs(60))
            .await
            .unwrap();
        store.destroy(b"hash").await.unwrap();
        assert_eq!(store.load(b"hash").await.unwrap(), None);
        // Destroying twice is fine.
        store.destroy(b"hash").await.unwrap();
    }

    #[tokio::test]
    async fn save_rejects_ttl_past_clock_range() {
        let store = MemorySessionStore::new();
        let result = store
            .save(b"hash", &signed_in(), Duration::from_secs(u64::MAX))
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn cleanup_expired_removes_only_stale_entries() {
        let store = MemorySessionStore::new();
        store
            .save(b"fresh", &signed_in(), Duration::from_secs(60))
            .await
            .unwrap();
        store.save(b"stale", &signed_in(), Duration::ZERO).await.unwrap();
        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert_eq!(store.cleanup_expired().await.unwrap(), 0);
        assert_eq!(store.load(b"fresh").await.unwrap(), Some(signed_in()));
    }

    #[tokio::test]
    async fn save_purges_expired_entries() {
        let store = MemorySessionStore::new();
        store.save(b"stale", &signed_in(), Duration::ZERO).await.unwrap();
        store
            .save(b"fresh", &SessionData::default(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }
}
