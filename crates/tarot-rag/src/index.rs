use std::collections::HashMap;
use std::sync::Arc;
use tarot_core::Similarity;
use tarot_core::TarotError;
use tarot_core::RETRIEVAL_CONCURRENCY_LIMIT;
use tokio::sync::Semaphore;

use super::cache::EmbeddingCache;
use super::chunker::Chunk;
use super::model::ModelClient;
use super::store::RagChunk;
use super::store::ScoredChunk;
use super::store::VectorStore;

const UPSERT_STAGE: &str = "rag_upsert";

/// Embeds a query, consults the embedding cache, and searches the vector
/// store, bounding the number of in-flight searches process-wide (spec §4.2,
/// §C10 fan-out concurrency control).
pub struct RagIndex {
    model: Arc<dyn ModelClient>,
    store: Arc<dyn VectorStore>,
    cache: EmbeddingCache,
    semaphore: Arc<Semaphore>,
}

impl RagIndex {
    pub fn new(model: Arc<dyn ModelClient>, store: Arc<dyn VectorStore>) -> Self {
        Self::with_concurrency(model, store, RETRIEVAL_CONCURRENCY_LIMIT)
    }

    pub fn with_concurrency(model: Arc<dyn ModelClient>, store: Arc<dyn VectorStore>, limit: usize) -> Self {
        Self {
            model,
            store,
            cache: EmbeddingCache::new(),
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    pub async fn search(
        &self,
        stage: &'static str,
        query_text: &str,
        top_k: usize,
        min_similarity: Similarity,
    ) -> Result<Vec<ScoredChunk>, TarotError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("embedding search semaphore is never closed");

        let embedding = match self.cache.get(query_text) {
            Some(embedding) => embedding,
            None => {
                let embedding = self.model.embed(stage, query_text).await?;
                self.cache.insert(query_text, embedding.clone());
                embedding
            }
        };

        self.store.query(&embedding, top_k, min_similarity).await
    }

    /// Like [`Self::search`], but re-ranks the raw hits so no single source
    /// dominates the result: at most `ceil(top_k / sources_seen)` chunks are
    /// kept per source before backfilling from the overall ranking (spec §C
    /// supplement — balanced-source search, used by the spread-method and
    /// relationship context queries that should draw from more than one
    /// corpus source when several are loaded).
    pub async fn search_balanced(
        &self,
        stage: &'static str,
        query_text: &str,
        top_k: usize,
        min_similarity: Similarity,
    ) -> Result<Vec<ScoredChunk>, TarotError> {
        let overfetch = top_k.saturating_mul(3).max(top_k);
        let hits = self.search(stage, query_text, overfetch, min_similarity).await?;
        Ok(balance_by_source(hits, top_k))
    }

    /// Embeds each chunk's text (via the embedding cache, so re-ingesting an
    /// unchanged chunk costs no extra model call) and upserts it into the
    /// vector store keyed on chunk id — idempotent on chunk id, last write
    /// wins on text and embedding (spec §4.2).
    ///
    /// `chunk_id` is `"{base_id}#{chunk_index + 1}"`, matching the
    /// `<baseId>#1, #2, …` convention chunk ids are labeled with elsewhere.
    pub async fn upsert(&self, base_id: &str, source: &str, chunks: &[Chunk]) -> Result<(), TarotError> {
        for chunk in chunks {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .expect("embedding search semaphore is never closed");

            let embedding = match self.cache.get(&chunk.text) {
                Some(embedding) => embedding,
                None => {
                    let embedding = self.model.embed(UPSERT_STAGE, &chunk.text).await?;
                    self.cache.insert(&chunk.text, embedding.clone());
                    embedding
                }
            };
            drop(_permit);

            let rag_chunk = RagChunk {
                id: format!("{base_id}#{}", chunk.chunk_index + 1),
                text: chunk.text.clone(),
                source: source.to_string(),
                source_page: chunk.source_page,
            };
            self.store.upsert(&rag_chunk, &embedding).await?;
        }
        Ok(())
    }
}

fn balance_by_source(hits: Vec<ScoredChunk>, top_k: usize) -> Vec<ScoredChunk> {
    let source_count = hits
        .iter()
        .map(|h| h.chunk.source.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len()
        .max(1);
    let per_source_cap = top_k.div_ceil(source_count).max(1);

    let mut taken_per_source: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::new();
    let mut leftover = Vec::new();

    for hit in hits {
        let count = taken_per_source.entry(hit.chunk.source.clone()).or_insert(0);
        if *count < per_source_cap && selected.len() < top_k {
            *count += 1;
            selected.push(hit);
        } else {
            leftover.push(hit);
        }
    }

    let mut remaining = top_k.saturating_sub(selected.len());
    for hit in leftover {
        if remaining == 0 {
            break;
        }
        selected.push(hit);
        remaining -= 1;
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatRequest;
    use crate::store::InMemoryVectorStore;
    use crate::store::RagChunk;
    use async_trait::async_trait;

    struct EchoModel;

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn chat(&self, _stage: &'static str, _request: ChatRequest) -> Result<String, TarotError> {
            Ok(String::new())
        }

        async fn chat_stream(&self, _stage: &'static str, _request: ChatRequest) -> Result<crate::model::ChatStream, TarotError> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn embed(&self, _stage: &'static str, text: &str) -> Result<Vec<f32>, TarotError> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn embedding_dimensions(&self) -> tarot_core::Dimensions {
            2
        }
    }

    fn chunk(id: &str, source: &str) -> RagChunk {
        RagChunk {
            id: id.to_string(),
            text: format!("lore for {id}"),
            source: source.to_string(),
            source_page: None,
        }
    }

    #[tokio::test]
    async fn search_caches_embeddings_across_calls() {
        let mut store = InMemoryVectorStore::new();
        store.insert(chunk("a", "pkt"), vec![3.0, 1.0]);
        let index = RagIndex::new(Arc::new(EchoModel), Arc::new(store));

        let first = index.search("test", "abc", 5, 0.0).await.unwrap();
        let second = index.search("test", "abc", 5, 0.0).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_chunk_id() {
        let store = InMemoryVectorStore::new();
        let index = RagIndex::new(Arc::new(EchoModel), Arc::new(store));

        let chunks = vec![crate::chunker::Chunk {
            text: "abc".to_string(),
            source_page: Some(1),
            chunk_index: 0,
        }];
        index.upsert("deck-waite", "pkt", &chunks).await.unwrap();
        index.upsert("deck-waite", "pkt", &chunks).await.unwrap();

        let hits = index.search("test", "abc", 10, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "deck-waite#1");
    }

    #[tokio::test]
    async fn balance_by_source_spreads_picks_across_sources() {
        let hits = vec![
            ScoredChunk { chunk: chunk("a1", "pkt"), similarity: 0.9 },
            ScoredChunk { chunk: chunk("a2", "pkt"), similarity: 0.8 },
            ScoredChunk { chunk: chunk("a3", "pkt"), similarity: 0.7 },
            ScoredChunk { chunk: chunk("b1", "78degrees"), similarity: 0.6 },
        ];
        let balanced = balance_by_source(hits, 2);
        let sources: std::collections::HashSet<_> = balanced.iter().map(|h| h.chunk.source.clone()).collect();
        assert_eq!(balanced.len(), 2);
        assert_eq!(sources.len(), 2);
    }
}
