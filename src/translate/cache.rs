//! Translation cache: store trait, content-derived keys, in-memory LRU store.
//! Key: "trans_{src}_{tgt}_" + blake3 of (src | tgt | text).
//! Entries are never invalidated; a changed source text hashes to a new key.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

/// Prefix shared by every translation cache key.
pub const KEY_PREFIX: &str = "trans";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite cache error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Key/value store with per-entry expiry, shared by all requests.
///
/// Failures are reported but callers treat them as a miss.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Compute the cache key for a translation. Language codes must already
/// be normalized.
///
/// Components are length-prefixed before hashing so that codes containing
/// `_` cannot shift bytes between fields.
pub fn cache_key(text: &str, source_lang: &str, target_lang: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [source_lang, target_lang, text] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!(
        "{KEY_PREFIX}_{source_lang}_{target_lang}_{}",
        hasher.finalize().to_hex()
    )
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local LRU cache with per-entry TTL.
pub struct MemoryCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    /// Look up a cached value. Returns None if absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(key) {
            if Instant::now() < entry.expires_at {
                return Ok(Some(entry.value.clone()));
            }
            cache.pop(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + Duration::from_secs(u32::MAX as u64));
        self.inner.lock().put(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}
