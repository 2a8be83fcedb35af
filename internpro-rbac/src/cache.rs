//! In-process cache of authorization decisions

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::RbacConfig;

/// Identity of a cached decision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecisionKey {
    /// user holds a permission on `(resource, action)`
    UserPermission {
        user_id: Uuid,
        resource: String,
        action: String,
    },
    /// user holds the role with `slug`
    UserRole { user_id: Uuid, slug: String },
    /// role has been granted the permission with `slug`
    RolePermission { role_id: Uuid, slug: String },
}

/// Decision cache. When disabled every lookup misses and inserts are dropped.
///
/// Clones share the same underlying store, so invalidation through any
/// handle is seen by all of them.
///
/// Every invalidation bumps a generation counter. A decision evaluated
/// under an older generation is never left in the store, so a check that
/// raced a revocation cannot cache the pre-revocation answer.
#[derive(Clone)]
pub struct DecisionCache {
    inner: Option<Cache<DecisionKey, bool>>,
    generation: Arc<AtomicU64>,
}

impl DecisionCache {
    /// Build a cache with the given capacity and time-to-live
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Some(inner),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            inner: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build according to the engine configuration
    pub fn from_config(config: &RbacConfig) -> Self {
        if config.enable_cache {
            Self::new(config.cache_capacity, config.cache_ttl)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &DecisionKey) -> Option<bool> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    /// Current invalidation generation. Read it before evaluating a
    /// decision and hand it to [`DecisionCache::insert`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store a decision evaluated under `generation`. Returns false when an
    /// invalidation happened since, in which case nothing is kept.
    pub async fn insert(&self, key: DecisionKey, allowed: bool, generation: u64) -> bool {
        let Some(cache) = &self.inner else {
            return false;
        };

        if self.generation() != generation {
            return false;
        }
        cache.insert(key.clone(), allowed).await;

        // An invalidation may have slipped in between the check and the insert
        if self.generation() != generation {
            cache.invalidate(&key).await;
            return false;
        }
        true
    }

    /// Drop every cached decision. Takes effect immediately for readers.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
            debug!("Invalidated authorization decision cache");
        }
    }
}

impl std::fmt::Debug for DecisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
