//! Query-policy wrapper around the vector index, with a memoizing cache.
//!
//! The [`Retriever`] fixes `k`/`fetch_k` and caches results under the
//! literal question string in a bounded LRU map. A cache hit replays
//! the prior result without touching the index; a rephrased question is
//! a miss (no semantic dedup at this layer). The cache is mutex-guarded
//! so sessions sharing a process stay safe, and the lock is never held
//! across an await.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::embedding::EmbeddingClient;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::models::RetrievedChunk;

/// Bounded map with strict least-recently-used eviction.
///
/// Both lookups and inserts count as use. The recency scan is linear;
/// intended for small capacities like the default of 100.
pub struct LruCache {
    capacity: usize,
    map: HashMap<String, Vec<RetrievedChunk>>,
    order: VecDeque<String>,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Vec<RetrievedChunk>> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.map.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, value: Vec<RetrievedChunk>) {
        if self.map.contains_key(&key) {
            self.touch(&key);
            self.map.insert(key, value);
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.to_string());
    }
}

/// Retrieval front-end: fixed query policy plus the question cache.
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingClient>,
    k: usize,
    fetch_k: usize,
    cache: Mutex<LruCache>,
}

impl Retriever {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingClient>,
        k: usize,
        fetch_k: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            k,
            fetch_k,
            cache: Mutex::new(LruCache::new(cache_capacity)),
        }
    }

    /// Return the most relevant chunks for `question`, most similar
    /// first. Repeated questions are answered from the cache with a
    /// byte-identical result.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if let Some(hit) = self.lock_cache().get(question) {
            tracing::debug!(question, "retrieval cache hit");
            return Ok(hit);
        }

        let results = self
            .index
            .search(question, self.k, self.fetch_k, self.embedder.as_ref())
            .await?;

        self.lock_cache()
            .insert(question.to_string(), results.clone());
        Ok(results)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
