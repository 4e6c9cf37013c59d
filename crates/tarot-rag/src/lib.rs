//! Chunking, embedding cache, model client, and vector-store retrieval
//! (spec §4.1 Chunker, §4.2 RagIndex/VectorStore, §4.3 ModelClient).

mod cache;
mod chunker;
mod index;
mod model;
mod store;

pub use cache::EmbeddingCache;
pub use chunker::chunk_text;
pub use chunker::Chunk;
pub use index::RagIndex;
pub use model::strip_reasoning;
pub use model::ChatChunk;
pub use model::ChatRequest;
pub use model::ChatStream;
pub use model::HttpModelClient;
pub use model::ModelClient;
pub use store::InMemoryVectorStore;
pub use store::RagChunk;
pub use store::ScoredChunk;
pub use store::VectorStore;
