use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::Client;

use tarot_core::Similarity;
use tarot_core::TarotError;
use tarot_rag::RagChunk;
use tarot_rag::ScoredChunk;
use tarot_rag::VectorStore;

use crate::schema::RAG_CHUNKS;

/// Postgres-backed vector store (spec §4.2 VectorStore). Embeddings are
/// stored as a plain `real[]` column; similarity is scored in Rust rather
/// than through `pgvector`, since no `pgvector` client crate is in the
/// dependency stack (see DESIGN.md).
pub struct PgVectorStore {
    client: Arc<Client>,
}

impl PgVectorStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
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
impl VectorStore for PgVectorStore {
    async fn query(&self, embedding: &[f32], top_k: usize, min_similarity: Similarity) -> Result<Vec<ScoredChunk>, TarotError> {
        const SQL: &str =
            const_format::concatcp!("SELECT chunk_id, source, source_page, text, embedding FROM ", RAG_CHUNKS);
        let rows = self
            .client
            .query(SQL, &[])
            .await
            .map_err(|e| TarotError::Persistence { detail: e.to_string() })?;

        let mut scored: Vec<ScoredChunk> = rows
            .into_iter()
            .map(|row| {
                let stored: Vec<f32> = row.get(4);
                let chunk = RagChunk {
                    id: row.get(0),
                    source: row.get(1),
                    source_page: row.get::<_, Option<i32>>(2).map(|p| p as u32),
                    text: row.get(3),
                };
                ScoredChunk { similarity: cosine_similarity(embedding, &stored), chunk }
            })
            .filter(|scored| scored.similarity >= min_similarity)
            .collect();

        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Upserts one chunk, keyed by `chunk_id` (spec §6 `rag_chunks`).
    async fn upsert(&self, chunk: &RagChunk, embedding: &[f32]) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "INSERT INTO ",
            RAG_CHUNKS,
            " (chunk_id, source, source_page, text, embedding) ",
            "VALUES ($1, $2, $3, $4, $5) ",
            "ON CONFLICT (chunk_id) DO UPDATE SET ",
            "source = EXCLUDED.source, ",
            "source_page = EXCLUDED.source_page, ",
            "text = EXCLUDED.text, ",
            "embedding = EXCLUDED.embedding"
        );
        self.client
            .execute(
                SQL,
                &[
                    &chunk.id,
                    &chunk.source,
                    &chunk.source_page.map(|p| p as i32),
                    &chunk.text,
                    &embedding,
                ],
            )
            .await
            .map_err(|e| TarotError::Persistence { detail: e.to_string() })?;
        Ok(())
    }
}
