//! Content-addressed render cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::{CacheEntry, CacheStats};

/// 32-bit rolling hash (`h * 31 + unit`) over UTF-16 code units.
pub fn content_hash(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

#[derive(Debug)]
pub struct RenderCache {
    entries: HashMap<u32, CacheEntry>,
    max_entries: usize,
    ttl: Duration,
}

impl RenderCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.entries.len(),
            max_cache_size: self.max_entries,
            cache_timeout: self.ttl,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) > self.ttl
    }

    /// Cached HTML for `source`, dropping the entry if it has expired.
    pub fn get(&mut self, source: &str) -> Option<Arc<str>> {
        let key = content_hash(source);
        let entry = self.entries.get(&key)?;
        if self.is_expired(entry, Instant::now()) {
            self.entries.remove(&key);
            tracing::debug!(key, "render cache entry expired");
            return None;
        }
        if entry.source != source {
            tracing::debug!(key, "render cache hash collision");
            return None;
        }
        Some(Arc::clone(&entry.html))
    }

    /// The live entry for `source`, if any.
    pub fn entry(&self, source: &str) -> Option<&CacheEntry> {
        self.entries
            .get(&content_hash(source))
            .filter(|entry| entry.source == source && !self.is_expired(entry, Instant::now()))
    }

    pub fn insert(&mut self, source: String, html: Arc<str>) {
        let key = content_hash(&source);
        self.entries.insert(
            key,
            CacheEntry {
                html,
                source,
                timestamp: Instant::now(),
            },
        );
        self.evict();
    }

    /// Purge expired entries once the cache is half again over its limit,
    /// then drop the oldest until it fits.
    fn evict(&mut self) {
        if self.entries.len() * 2 > self.max_entries * 3 {
            let now = Instant::now();
            let ttl = self.ttl;
            self.entries
                .retain(|_, entry| now.saturating_duration_since(entry.timestamp) <= ttl);
        }
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| *key)
            else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn html(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn test_hash_matches_utf16_rolling_hash() {
        assert_eq!(content_hash(""), 0);
        assert_eq!(content_hash("a"), 97);
        assert_eq!(content_hash("ab"), 97 * 31 + 98);
        // one astral char hashes as two surrogate units
        let expected = 0xD83Du32.wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(content_hash("😀"), expected);
    }

    #[test]
    fn test_get_returns_inserted() {
        let mut cache = RenderCache::new(4, Duration::from_secs(60));
        cache.insert("x".into(), html("<p>x</p>"));
        assert_eq!(cache.get("x").as_deref(), Some("<p>x</p>"));
        assert!(cache.get("y").is_none());
    }

    #[test]
    fn test_collision_is_a_miss() {
        // "Aa" and "BB" collide under h*31+c
        assert_eq!(content_hash("Aa"), content_hash("BB"));
        let mut cache = RenderCache::new(4, Duration::from_secs(60));
        cache.insert("Aa".into(), html("<p>Aa</p>"));
        assert!(cache.get("BB").is_none());
        assert!(cache.entry("BB").is_none());
        assert!(cache.get("Aa").is_some());
    }

    #[test]
    fn test_expired_entry_removed_on_lookup() {
        let mut cache = RenderCache::new(4, Duration::from_millis(1));
        cache.insert("x".into(), html("<p>x</p>"));
        sleep(Duration::from_millis(10));
        assert!(cache.get("x").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evicts_oldest_over_limit() {
        let mut cache = RenderCache::new(2, Duration::from_secs(60));
        cache.insert("a".into(), html("a"));
        sleep(Duration::from_millis(2));
        cache.insert("b".into(), html("b"));
        sleep(Duration::from_millis(2));
        cache.insert("c".into(), html("c"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_purges_expired_when_far_over_limit() {
        let mut cache = RenderCache::new(1, Duration::from_millis(5));
        cache.insert("a".into(), html("a"));
        sleep(Duration::from_millis(20));
        cache.insert("b".into(), html("b"));
        assert_eq!(cache.len(), 1);
        assert!(cache.entry("b").is_some());
    }

    #[test]
    fn test_stats_and_clear() {
        let mut cache = RenderCache::new(3, Duration::from_secs(9));
        cache.insert("a".into(), html("a"));
        let stats = cache.stats();
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.max_cache_size, 3);
        assert_eq!(stats.cache_timeout, Duration::from_secs(9));
        cache.clear();
        assert!(cache.is_empty());
    }
}
