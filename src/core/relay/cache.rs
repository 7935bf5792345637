//! Per-scope public key cache.
//!
//! Owned by the relay instance. Entries live for the process lifetime
//! unless a TTL is set or they are invalidated explicitly (e.g. after
//! GitHub rotates a scope's key).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use super::scope::Scope;
use super::types::ScopePublicKey;

struct CachedKey {
    key: ScopePublicKey,
    fetched_at: Instant,
}

/// Memoized scope keys.
///
/// The lock only guards map access; fetching happens outside it, so
/// concurrent first lookups of one scope may each fetch.
#[derive(Default)]
pub struct KeyCache {
    entries: Mutex<HashMap<Scope, CachedKey>>,
    ttl: Option<Duration>,
}

impl KeyCache {
    /// Cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries expire `ttl` after being fetched.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Scope, CachedKey>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached key for `scope`, unless absent or expired.
    pub fn get(&self, scope: &Scope) -> Option<ScopePublicKey> {
        let mut entries = self.lock();
        let expired = match (entries.get(scope), self.ttl) {
            (None, _) => return None,
            (Some(cached), Some(ttl)) => cached.fetched_at.elapsed() >= ttl,
            (Some(_), None) => false,
        };

        if expired {
            debug!(scope = %scope, "scope key expired");
            entries.remove(scope);
            return None;
        }
        entries.get(scope).map(|c| c.key.clone())
    }

    pub fn insert(&self, scope: Scope, key: ScopePublicKey) {
        debug!(scope = %scope, key_id = %key.key_id, "caching scope key");
        self.lock().insert(
            scope,
            CachedKey {
                key,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop the cached key for `scope`. Returns whether one was cached.
    pub fn invalidate(&self, scope: &Scope) -> bool {
        let removed = self.lock().remove(scope).is_some();
        if removed {
            debug!(scope = %scope, "scope key invalidated");
        }
        removed
    }

    /// Drop every cached key.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
