use std::sync::Mutex;

use async_trait::async_trait;
use tarot_core::Similarity;
use tarot_core::TarotError;

/// One retrievable unit of card lore (spec §3 RagChunk).
#[derive(Debug, Clone, PartialEq)]
pub struct RagChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub source_page: Option<u32>,
}

/// A chunk plus the similarity it scored against a query embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: RagChunk,
    pub similarity: Similarity,
}

/// A nearest-neighbour backend over embedded card lore (spec §4.2
/// VectorStore). Concrete storage (e.g. Postgres/pgvector) lives in
/// `tarot-database`; this crate only depends on the interface.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Similarity,
    ) -> Result<Vec<ScoredChunk>, TarotError>;

    /// Upserts one chunk, keyed by chunk id (spec §4.2 — "idempotent on
    /// chunk id... last write wins on embedding and text").
    async fn upsert(&self, chunk: &RagChunk, embedding: &[f32]) -> Result<(), TarotError>;
}

/// Deterministic, dependency-free vector store used by tests and as a
/// development fixture: ranks chunks by cosine similarity computed in
/// memory rather than delegating to an external index.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: Mutex<Vec<(RagChunk, Vec<f32>)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent on chunk id: replaces an existing entry in place rather
    /// than appending a duplicate (spec §4.2 upsert semantics).
    pub fn insert(&mut self, chunk: RagChunk, embedding: Vec<f32>) {
        let entries = self.entries.get_mut().expect("in-memory vector store poisoned");
        match entries.iter_mut().find(|(existing, _)| existing.id == chunk.id) {
            Some(slot) => *slot = (chunk, embedding),
            None => entries.push((chunk, embedding)),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Similarity {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Similarity,
    ) -> Result<Vec<ScoredChunk>, TarotError> {
        let entries = self.entries.lock().expect("in-memory vector store poisoned");
        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|(chunk, vector)| ScoredChunk {
                chunk: chunk.clone(),
                similarity: cosine_similarity(embedding, vector),
            })
            .filter(|scored| scored.similarity >= min_similarity)
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn upsert(&self, chunk: &RagChunk, embedding: &[f32]) -> Result<(), TarotError> {
        let mut entries = self.entries.lock().expect("in-memory vector store poisoned");
        match entries.iter_mut().find(|(existing, _)| existing.id == chunk.id) {
            Some(slot) => *slot = (chunk.clone(), embedding.to_vec()),
            None => entries.push((chunk.clone(), embedding.to_vec())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, source: &str) -> RagChunk {
        RagChunk {
            id: id.to_string(),
            text: format!("lore for {id}"),
            source: source.to_string(),
            source_page: None,
        }
    }

    #[tokio::test]
    async fn query_ranks_by_cosine_similarity_descending() {
        let mut store = InMemoryVectorStore::new();
        store.insert(chunk("a", "pkt"), vec![1.0, 0.0]);
        store.insert(chunk("b", "pkt"), vec![0.0, 1.0]);
        store.insert(chunk("c", "pkt"), vec![0.9, 0.1]);

        let results = store.query(&[1.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results[0].chunk.id, "a");
        assert_eq!(results[1].chunk.id, "c");
        assert_eq!(results[2].chunk.id, "b");
    }

    #[tokio::test]
    async fn min_similarity_filters_out_weak_matches() {
        let mut store = InMemoryVectorStore::new();
        store.insert(chunk("a", "pkt"), vec![1.0, 0.0]);
        store.insert(chunk("b", "pkt"), vec![0.0, 1.0]);

        let results = store.query(&[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "a");
    }

    #[tokio::test]
    async fn top_k_bounds_result_count() {
        let mut store = InMemoryVectorStore::new();
        for i in 0..5 {
            store.insert(chunk(&i.to_string(), "pkt"), vec![1.0, 0.0]);
        }
        let results = store.query(&[1.0, 0.0], 2, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn upsert_on_an_existing_chunk_id_overwrites_rather_than_duplicates() {
        let store = InMemoryVectorStore::new();
        store.upsert(&chunk("a", "pkt"), &[1.0, 0.0]).await.unwrap();
        store.upsert(&chunk("a", "pkt"), &[0.0, 1.0]).await.unwrap();

        let results = store.query(&[0.0, 1.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity, 1.0);
    }
}
