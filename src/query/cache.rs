use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::query::ast::QueryNode;

/// Parsed query trees keyed by the raw query text
pub struct ParseCache {
    cache: Mutex<LruCache<String, QueryNode>>,
    capacity: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

impl ParseCache {
    /// A capacity of zero is bumped to one
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        ParseCache {
            cache: Mutex::new(LruCache::new(cap)),
            capacity: cap.get(),
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, query: &str) -> Option<QueryNode> {
        let mut cache = self.cache.lock();
        if let Some(node) = cache.get(query) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            Some(node.clone())
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Cached tree for `query`, parsing with `parse` on a miss
    pub fn get_or_insert_with(&self, query: &str, parse: impl FnOnce() -> QueryNode) -> QueryNode {
        if let Some(node) = self.get(query) {
            return node;
        }
        let node = parse();
        self.put(query.to_string(), node.clone());
        node
    }

    pub fn put(&self, query: String, node: QueryNode) {
        self.cache.lock().put(query, node);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_and_misses() {
        let cache = ParseCache::new(2);
        let parsed = cache.get_or_insert_with("rust", || QueryNode::term("rust"));
        assert_eq!(parsed, QueryNode::term("rust"));
        let again = cache.get_or_insert_with("rust", || panic!("should be cached"));
        assert_eq!(again, parsed);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_eviction() {
        let cache = ParseCache::new(1);
        cache.put("a".into(), QueryNode::term("a"));
        cache.put("b".into(), QueryNode::term("b"));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().size, 1);
    }
}
