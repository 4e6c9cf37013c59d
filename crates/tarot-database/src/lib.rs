//! Postgres-backed persistence: schema/migrations and concrete
//! `DeckRepository`/`VectorStore`/`AuditSink`/`ReadingStore` implementations
//! (spec §3 Data model, §6 Persistence layout).

mod audit_sink;
mod connect;
mod deck;
mod reading_store;
mod schema;
mod vector_store;

pub use audit_sink::PgAuditSink;
pub use connect::connect;
pub use connect::health_check;
pub use deck::PgDeckRepository;
pub use reading_store::PgReadingStore;
pub use schema::Schema;
pub use schema::RAG_CHUNKS;
pub use schema::READINGS;
pub use schema::READING_CARDS;
pub use schema::READING_PROCESS_DATA;
pub use schema::TAROT_CARDS;
pub use vector_store::PgVectorStore;
