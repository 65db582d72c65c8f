//! TTL response cache for primary-provider payloads.
//!
//! Entries are keyed by the fully qualified upstream URL. Expired entries are
//! removed lazily by the `get` that finds them; there is no background sweep
//! and no size bound. Each process caches independently.

use dashmap::DashMap;
use log::debug;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Storage seam for cached upstream responses
pub trait CacheStore: Send + Sync {
    /// Return the payload stored under `key` if it has not expired.
    /// An expired entry is removed and reported as a miss.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `data` under `key` for `ttl`, replacing any existing entry
    fn put(&self, key: &str, data: Value, ttl: Duration);
}

struct CacheEntry {
    expires_at: Instant,
    data: Value,
}

/// Thread-safe in-memory [`CacheStore`]
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // A concurrent put may refresh the entry between the expiry check and
    // the removal, so expiry is checked again under the write lock
    fn evict_if_expired(&self, key: &str) {
        self.entries
            .remove_if(key, |_, entry| Instant::now() > entry.expires_at);
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() <= entry.expires_at {
                return Some(entry.data.clone());
            }
            // Release the read guard before removing
            drop(entry);
            debug!("Cache entry expired: {}", key);
            self.evict_if_expired(key);
        }
        None
    }

    fn put(&self, key: &str, data: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                expires_at: Instant::now() + ttl,
                data,
            },
        );
    }
}
