// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Action Cache
//!
//! Bounded, time-limited [`ActionCache`] shared by every request handler.
//! Entries are whole persisted actions as handed over by distribution; an
//! entry older than the TTL is evicted on read and reported as a miss.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use crate::domain::action::{Action, ActionCache, ActionId};

struct CachedAction {
    action: Action,
    inserted_at: Instant,
}

pub struct LruActionCache {
    entries: Mutex<LruCache<ActionId, CachedAction>>,
    ttl: Duration,
}

impl LruActionCache {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActionCache for LruActionCache {
    fn get(&self, id: &ActionId) -> Option<Action> {
        let mut entries = self.entries.lock();

        let expired = match entries.get(id) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => return Some(entry.action.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(id);
        }
        None
    }

    fn put(&self, action: Action) {
        let id = action.id.clone();
        let entry = CachedAction {
            action,
            inserted_at: Instant::now(),
        };
        self.entries.lock().put(id, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let cache = LruActionCache::new(4, Duration::from_secs(60));
        cache.put(Action::new("a-1", "UPGRADE"));

        let hit = cache.get(&ActionId::new("a-1")).unwrap();
        assert_eq!(hit.action_type, "UPGRADE");
        assert!(cache.get(&ActionId::new("a-2")).is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = LruActionCache::new(4, Duration::ZERO);
        cache.put(Action::new("a-1", "UPGRADE"));

        assert!(cache.get(&ActionId::new("a-1")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let cache = LruActionCache::new(2, Duration::from_secs(60));
        cache.put(Action::new("a-1", "UPGRADE"));
        cache.put(Action::new("a-2", "UPGRADE"));
        assert!(cache.get(&ActionId::new("a-1")).is_some());
        cache.put(Action::new("a-3", "UNENROLL"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&ActionId::new("a-1")).is_some());
        assert!(cache.get(&ActionId::new("a-2")).is_none());
        assert!(cache.get(&ActionId::new("a-3")).is_some());
    }
}
