//! Content-addressed caches for everything expensive
//!
//! Typesetting, markup measurement and rasterization are all slow, and
//! synchronous layout must not stall on a cold path twice. A
//! [`ContentCache`] remembers each result under a key built from the full
//! content plus the style that produced it.
//!
//! Entries are write-once and nothing is evicted: the number of distinct
//! labels in a session bounds the size. Stale results are never read
//! because the keys that could go stale carry the engine state that
//! produced them.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

use crate::{types::SegmentKind, StyleKey};

/// Identifies a measured piece of content under a style
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct MetricsKey {
    /// The full content; never a hash, so distinct texts never collide
    pub content: String,
    /// Literal `\(x\)` and math `x` share a source string
    pub kind: SegmentKind,
    pub style: StyleKey,
    /// Whether the math engine was ready; degraded and real boxes differ
    pub engine_ready: bool,
}

impl MetricsKey {
    pub fn new(content: impl Into<String>, kind: SegmentKind, style: StyleKey, engine_ready: bool) -> Self {
        Self {
            content: content.into(),
            kind,
            style,
            engine_ready,
        }
    }

    /// Key for literal text
    pub fn text(content: impl Into<String>, style: StyleKey, engine_ready: bool) -> Self {
        Self::new(content, SegmentKind::Text, style, engine_ready)
    }

    /// Key for a math segment's delimited source
    pub fn math(source: impl Into<String>, style: StyleKey, engine_ready: bool) -> Self {
        Self::new(source, SegmentKind::Math, style, engine_ready)
    }
}

/// Hit and miss counters for one cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.requests as f64
        }
    }
}

/// Append-only map from content keys to computed values
pub struct ContentCache<K: Hash + Eq + Clone, V: Clone> {
    entries: RwLock<HashMap<K, V>>,
    stats: RwLock<CacheMetrics>,
}

impl<K: Hash + Eq + Clone, V: Clone> ContentCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheMetrics::default()),
        }
    }

    /// Look up a value, counting the hit or miss
    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.entries.read().get(key).cloned();
        let mut stats = self.stats.write();
        stats.requests += 1;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    /// Store a value; the first write for a key wins
    pub fn insert(&self, key: K, value: V) -> V {
        self.entries.write().entry(key).or_insert(value).clone()
    }

    /// Return the cached value or compute, store and return it
    ///
    /// The lock is not held while `compute` runs, so computations may
    /// consult this cache themselves.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        log::trace!("content cache miss, computing");
        let value = compute();
        self.insert(key, value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of hits, misses and size
    pub fn metrics(&self) -> CacheMetrics {
        let mut metrics = self.stats.read().clone();
        metrics.entries = self.len();
        metrics
    }

    /// One-line human-readable summary
    pub fn report(&self, name: &str) -> String {
        let m = self.metrics();
        format!(
            "{}: {} entries, {} hits / {} requests ({:.1}%)",
            name,
            m.entries,
            m.hits,
            m.requests,
            m.hit_rate() * 100.0
        )
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for ContentCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabelStyle;

    #[test]
    fn test_get_or_insert_computes_once() {
        let cache: ContentCache<String, u32> = ContentCache::new();
        let mut calls = 0;
        let a = cache.get_or_insert_with("k".to_string(), || {
            calls += 1;
            7
        });
        let b = cache.get_or_insert_with("k".to_string(), || {
            calls += 1;
            8
        });
        assert_eq!((a, b), (7, 7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_first_write_wins() {
        let cache: ContentCache<u32, &str> = ContentCache::new();
        cache.insert(1, "one");
        assert_eq!(cache.insert(1, "uno"), "one");
        assert_eq!(cache.get(&1), Some("one"));
    }

    #[test]
    fn test_metrics_count_hits_and_misses() {
        let cache: ContentCache<u32, u32> = ContentCache::new();
        cache.insert(1, 10);
        cache.get(&1);
        cache.get(&2);

        let metrics = cache.metrics();
        assert_eq!(metrics.requests, 2);
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.entries, 1);
        assert!(cache.report("test").starts_with("test: 1 entries"));
    }

    #[test]
    fn test_distinct_content_never_collides() {
        let style = LabelStyle::default().key();
        let cache: ContentCache<MetricsKey, u32> = ContentCache::new();
        cache.insert(MetricsKey::text("a+b", style.clone(), true), 1);
        cache.insert(MetricsKey::text("a-b", style.clone(), true), 2);
        assert_eq!(cache.get(&MetricsKey::text("a+b", style.clone(), true)), Some(1));
        assert_eq!(cache.get(&MetricsKey::text("a-b", style, true)), Some(2));
    }

    #[test]
    fn test_engine_state_separates_entries() {
        let style = LabelStyle::default().key();
        let cache: ContentCache<MetricsKey, u32> = ContentCache::new();
        cache.insert(MetricsKey::text("x", style.clone(), false), 1);
        assert_eq!(cache.get(&MetricsKey::text("x", style, true)), None);
    }

    #[test]
    fn test_kind_separates_same_source() {
        let style = LabelStyle::default().key();
        let cache: ContentCache<MetricsKey, u32> = ContentCache::new();
        cache.insert(MetricsKey::math("\\(x\\)", style.clone(), true), 1);
        assert_eq!(cache.get(&MetricsKey::text("\\(x\\)", style.clone(), true)), None);
        cache.insert(MetricsKey::text("\\(x\\)", style.clone(), true), 2);
        assert_eq!(cache.get(&MetricsKey::math("\\(x\\)", style, true)), Some(1));
    }
}
