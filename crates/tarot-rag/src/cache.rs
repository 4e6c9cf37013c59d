use sha2::Digest;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;
use tarot_core::EMBEDDING_CACHE_CAPACITY;

/// Caches embedding vectors by a hash of their source text. Bounded: once
/// `EMBEDDING_CACHE_CAPACITY` entries are stored, further misses are still
/// computed and returned but not inserted (spec §4.2 — no eviction policy,
/// the cache simply stops growing).
pub struct EmbeddingCache {
    entries: Mutex<HashMap<String, Vec<f32>>>,
    capacity: usize,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::with_capacity(EMBEDDING_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn key_for(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.to_lowercase().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let key = Self::key_for(text);
        self.entries.lock().expect("embedding cache poisoned").get(&key).cloned()
    }

    pub fn insert(&self, text: &str, embedding: Vec<f32>) {
        let key = Self::key_for(text);
        let mut entries = self.entries.lock().expect("embedding cache poisoned");
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            return;
        }
        entries.insert(key, embedding);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("embedding cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_insert_then_hit() {
        let cache = EmbeddingCache::new();
        assert!(cache.get("the fool").is_none());
        cache.insert("the fool", vec![0.1, 0.2]);
        assert_eq!(cache.get("the fool"), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn key_is_case_insensitive() {
        let cache = EmbeddingCache::new();
        cache.insert("The Fool", vec![0.1, 0.2]);
        assert_eq!(cache.get("the fool"), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn cache_stops_growing_past_capacity() {
        let cache = EmbeddingCache::with_capacity(1);
        cache.insert("a", vec![1.0]);
        cache.insert("b", vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn updating_an_existing_key_does_not_count_as_growth() {
        let cache = EmbeddingCache::with_capacity(1);
        cache.insert("a", vec![1.0]);
        cache.insert("a", vec![9.0]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(vec![9.0]));
    }
}
