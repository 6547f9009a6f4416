//! Short-lived result cache

use clustermap_util::{Clock, MonotonicInstant, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Cache key under which the reconciled occupancy list is stored
pub const RESPONSE_CACHE_KEY: &str = "response";

struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL overflows the clock; such entries never expire
    expires_at: Option<MonotonicInstant>,
}

/// Cache-aside store with per-entry TTL.
///
/// Expired entries are never removed explicitly; `get` ignores them and the
/// next `set` for the key overwrites them.
pub struct ResultCache<V> {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache driven by the system monotonic clock
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Value stored under `key`, unless it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;

        match entry.expires_at {
            Some(expires_at) if now >= expires_at => None,
            _ => Some(entry.value.clone()),
        }
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = self.clock.now().checked_add(ttl);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
    }
}
