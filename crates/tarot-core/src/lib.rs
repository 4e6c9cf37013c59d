//! Shared identifiers, type aliases, tunables, and the top-level error type
//! for the tarot reading orchestrator.
#![allow(dead_code)]

mod error;
mod id;

pub use error::TarotError;
pub use id::Unique;
pub use id::ID;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Cosine-similarity style score in `[-1.0, 1.0]`, though in practice `[0.0, 1.0]`.
pub type Similarity = f32;
/// Sampling temperature passed to a chat completion call.
pub type Temperature = f32;
/// Dimensionality of an embedding vector.
pub type Dimensions = usize;

// ============================================================================
// RAG TUNABLES (spec §4.1, §4.2, §4.9, §6 config surface)
// ============================================================================
/// Default target chunk size in tokens.
pub const CHUNK_TARGET_TOKENS: usize = 400;
/// Default chunk overlap in tokens.
pub const CHUNK_OVERLAP_TOKENS: usize = 60;
/// Approximate tokens-per-word ratio used to convert a token budget to a word count.
pub const TOKENS_PER_WORD: f32 = 0.75;
/// Default embedding dimensionality (OpenAI `text-embedding-3-small`).
pub const EMBEDDING_DIMENSIONS: Dimensions = 1536;
/// Default top-k for a generic (non-fan-out) RAG query.
pub const DEFAULT_TOP_K: usize = 6;
/// Default RAG chat temperature.
pub const DEFAULT_RAG_TEMPERATURE: Temperature = 0.1;
/// Embedding cache capacity; once full, misses are computed but not cached.
pub const EMBEDDING_CACHE_CAPACITY: usize = 1_000;
/// Process-wide cap on concurrent `RagIndex::search` calls.
pub const RETRIEVAL_CONCURRENCY_LIMIT: usize = 10;

/// Per-card fused semantic/position query top-k.
pub const CARD_QUERY_TOP_K: usize = 10;
/// Per-card fused semantic/position query minimum similarity.
pub const CARD_QUERY_MIN_SIM: Similarity = 0.5;
/// Per-card visual-description query top-k.
pub const CARD_VISUAL_TOP_K: usize = 5;
/// Per-card visual-description query minimum similarity.
pub const CARD_VISUAL_MIN_SIM: Similarity = 0.5;
/// Spread-method and relationship query top-k.
pub const CONTEXT_QUERY_TOP_K: usize = 5;
/// Spread-method and relationship query minimum similarity.
pub const CONTEXT_QUERY_MIN_SIM: Similarity = 0.25;

/// Max visual-description chunks fed into the imagery prompt per card.
pub const IMAGERY_CHUNKS_PER_CARD: usize = 3;
/// Character truncation applied to each imagery chunk.
pub const IMAGERY_CHUNK_CHARS: usize = 300;
/// Max deduplicated RAG chunks fed into the final interpretation prompt.
pub const INTERPRETATION_MAX_CHUNKS: usize = 50;
/// Character truncation applied to each interpretation chunk.
pub const INTERPRETATION_CHUNK_CHARS: usize = 500;

/// Temperature for the question-analysis LLM call.
pub const QUESTION_ANALYSIS_TEMPERATURE: Temperature = 0.3;
/// Temperature for the imagery-synthesis LLM call.
pub const IMAGERY_TEMPERATURE: Temperature = 0.7;
/// Temperature for the final-interpretation LLM call.
pub const INTERPRETATION_TEMPERATURE: Temperature = 0.7;

// ============================================================================
// CARD-SELECTION TUNABLES (spec §4.4)
// ============================================================================
/// Number of cards in a complete corpus for one named source.
pub const DECK_SIZE: usize = 78;
/// Number of major-arcana cards.
pub const MAJOR_ARCANA_COUNT: usize = 22;
/// Number of minor-arcana cards per suit.
pub const MINOR_SUIT_COUNT: usize = 14;
/// Probability that any given dealt card is reversed.
pub const REVERSAL_PROBABILITY: f64 = 0.45;
/// Number of "cut" rotations applied during a shuffle.
pub const CUT_COUNT: usize = 3;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initializes dual logging (terminal + file), mirroring the teacher's
/// `rbp_core::log()` convention: DEBUG to a timestamped file under `logs/`,
/// INFO to the terminal.
#[cfg(feature = "server")]
pub fn init_logging() {
    let _ = std::fs::create_dir_all("logs");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    match std::fs::File::create(format!("logs/{}.log", time)) {
        Ok(file) => {
            let written = simplelog::WriteLogger::new(log::LevelFilter::Debug, config, file);
            let _ = simplelog::CombinedLogger::init(vec![term, written]);
        }
        Err(_) => {
            let _ = simplelog::CombinedLogger::init(vec![term]);
        }
    }
}

/// Registers a Ctrl+C handler for immediate shutdown. Readings in flight are
/// simply dropped; no rollback is attempted (spec §5 cancellation semantics).
#[cfg(feature = "server")]
pub fn install_interrupt_handler() {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        log::warn!("interrupt received, exiting");
        std::process::exit(0);
    });
}
