//! Wizard session state
//!
//! One [`WizardSession`] per browsing session: it owns the local cache, the
//! handle to the record store, the configuration, and the per-key submit
//! locks. Page controllers borrow it for their lifetime and the whole thing
//! is dropped when the session ends.

use crate::cache::LocalCache;
use crate::config::FunnelConfig;
use crate::controller::PageController;
use crate::navigation::Navigator;
use crate::page::PageSpec;
use crate::view::PageView;
use dashmap::DashMap;
use funnel_record::{BusinessKey, RecordStore};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate new session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one wizard session
pub struct WizardSession {
    id: SessionId,
    cache: Arc<dyn LocalCache>,
    store: Arc<dyn RecordStore>,
    config: FunnelConfig,
    /// Single-writer lock per business key
    submit_locks: DashMap<BusinessKey, Arc<Mutex<()>>>,
}

impl WizardSession {
    /// Start a session
    #[must_use]
    pub fn new(
        cache: Arc<dyn LocalCache>,
        store: Arc<dyn RecordStore>,
        config: FunnelConfig,
    ) -> Arc<Self> {
        let session = Self {
            id: SessionId::new(),
            cache,
            store,
            config,
            submit_locks: DashMap::new(),
        };
        tracing::info!(session = %session.id, "wizard session started");
        Arc::new(session)
    }

    /// Session identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Local cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &dyn LocalCache {
        self.cache.as_ref()
    }

    /// Record store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    /// Business key cached by the first page
    #[inline]
    #[must_use]
    pub fn business_key(&self) -> Option<BusinessKey> {
        self.cache.business_key()
    }

    /// Acquire the submit lock for a business key
    ///
    /// Held across the read-merge-write sequence so two submits for the
    /// same key never interleave. The lock entry is dropped once no guard
    /// or waiter refers to it.
    pub async fn lock_key(&self, key: &BusinessKey) -> KeyGuard<'_> {
        let lock = self
            .submit_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        KeyGuard {
            session: self,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of business keys with a live submit lock
    #[inline]
    #[must_use]
    pub fn locked_keys(&self) -> usize {
        self.submit_locks.len()
    }

    /// Controller for one page of this session
    #[must_use]
    pub fn controller(
        self: &Arc<Self>,
        page: PageSpec,
        view: Arc<dyn PageView>,
        navigator: Arc<dyn Navigator>,
    ) -> PageController {
        PageController::new(Arc::clone(self), page, view, navigator)
    }
}

/// Held submit lock for one business key
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
    session: &'a WizardSession,
    key: BusinessKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.session
            .submit_locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl std::fmt::Debug for KeyGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for WizardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardSession")
            .field("id", &self.id)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("locked_keys", &self.submit_locks.len())
            .finish_non_exhaustive()
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        tracing::debug!(session = %self.id, "wizard session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SessionCache;
    use funnel_record::{InMemoryRecordStore, BUSINESS_KEY_FIELD};
    use std::time::Duration;

    fn session() -> Arc<WizardSession> {
        WizardSession::new(
            Arc::new(SessionCache::new()),
            Arc::new(InMemoryRecordStore::new()),
            FunnelConfig::default(),
        )
    }

    #[test]
    fn business_key_comes_from_cache() {
        let session = session();
        assert!(session.business_key().is_none());
        session.cache().set(BUSINESS_KEY_FIELD, "Acme Trust".into());
        assert_eq!(session.business_key().unwrap().as_str(), "Acme Trust");
    }

    #[test]
    fn sessions_have_distinct_ids() {
        assert_ne!(session().id(), session().id());
    }

    #[tokio::test]
    async fn key_lock_is_exclusive_per_key() {
        let session = session();
        let key = BusinessKey::parse("Acme Trust").unwrap();
        let other = BusinessKey::parse("Other Trust").unwrap();

        let guard = session.lock_key(&key).await;

        // A different key is not blocked.
        let _other_guard = session.lock_key(&other).await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), session.lock_key(&key)).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(20), session.lock_key(&key)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_forgotten() {
        let session = session();
        let key = BusinessKey::parse("Acme Trust").unwrap();

        let guard = session.lock_key(&key).await;
        assert_eq!(session.locked_keys(), 1);

        let waiter = {
            let session = Arc::clone(&session);
            let key = key.clone();
            tokio::spawn(async move {
                let _guard = session.lock_key(&key).await;
            })
        };
        tokio::task::yield_now().await;
        drop(guard);
        // The waiter still refers to the entry.
        waiter.await.unwrap();

        assert_eq!(session.locked_keys(), 0);
    }
}
