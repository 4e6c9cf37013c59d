/// Pure schema definitions for Postgres tables (spec §6 Persistence layout).
/// No I/O — every method returns `&'static str`, built at compile time with
/// `const_format::concatcp!` so table names are never duplicated by hand.
pub trait Schema {
    /// Name of the table in the database.
    fn name() -> &'static str;
    /// SQL to prepare the table (and any seed rows).
    fn creates() -> &'static str;
    /// SQL to create indices on the table.
    fn indices() -> &'static str;
    /// SQL to truncate the table, used by tests.
    fn truncates() -> &'static str;
    /// Binary `COPY` command for bulk loads. Not all tables support one;
    /// callers that don't bulk-load a table may leave this unimplemented.
    fn copy() -> &'static str;
    /// Column types, in `copy()` order.
    fn columns() -> &'static [tokio_postgres::types::Type];
}

pub const TAROT_CARDS: &str = "tarot_cards";
pub const RAG_CHUNKS: &str = "rag_chunks";
pub const READINGS: &str = "readings";
pub const READING_CARDS: &str = "reading_cards";
pub const READING_PROCESS_DATA: &str = "reading_process_data";

/// One row per corpus card (spec §4.4 DeckRepository backing store).
pub struct TarotCardsTable;

impl Schema for TarotCardsTable {
    fn name() -> &'static str {
        TAROT_CARDS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            TAROT_CARDS,
            " (
                id                  TEXT PRIMARY KEY,
                source              TEXT NOT NULL,
                card_name_en        TEXT NOT NULL,
                card_name_cn        TEXT,
                card_number         SMALLINT NOT NULL,
                suit                TEXT NOT NULL,
                arcana              TEXT NOT NULL,
                description         TEXT NOT NULL,
                upright_meaning     TEXT NOT NULL,
                reversed_meaning    TEXT NOT NULL,
                symbolic_meaning    TEXT,
                additional_meanings TEXT,
                image_url           TEXT,
                UNIQUE (source, card_name_en)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            TAROT_CARDS,
            "_source ON ",
            TAROT_CARDS,
            " (source);"
        )
    }
    fn truncates() -> &'static str {
        const_format::concatcp!("TRUNCATE TABLE ", TAROT_CARDS, ";")
    }
    fn copy() -> &'static str {
        unimplemented!("tarot_cards is seeded via upsert, not binary COPY")
    }
    fn columns() -> &'static [tokio_postgres::types::Type] {
        unimplemented!("tarot_cards is seeded via upsert, not binary COPY")
    }
}

/// One row per indexed lore chunk (spec §4.2 VectorStore backing store). The
/// embedding is stored as a plain `real[]` column and scored with cosine
/// similarity computed in Rust (no `pgvector` extension in the dependency
/// stack — see DESIGN.md).
pub struct RagChunksTable;

impl Schema for RagChunksTable {
    fn name() -> &'static str {
        RAG_CHUNKS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            RAG_CHUNKS,
            " (
                chunk_id    TEXT PRIMARY KEY,
                source      TEXT NOT NULL,
                source_page INTEGER,
                text        TEXT NOT NULL,
                embedding   REAL[] NOT NULL
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            RAG_CHUNKS,
            "_source ON ",
            RAG_CHUNKS,
            " (source);"
        )
    }
    fn truncates() -> &'static str {
        const_format::concatcp!("TRUNCATE TABLE ", RAG_CHUNKS, ";")
    }
    fn copy() -> &'static str {
        unimplemented!("rag_chunks is loaded via upsert, not binary COPY")
    }
    fn columns() -> &'static [tokio_postgres::types::Type] {
        unimplemented!("rag_chunks is loaded via upsert, not binary COPY")
    }
}

/// One row per reading (spec §3 Reading, §6 `readings`).
pub struct ReadingsTable;

impl Schema for ReadingsTable {
    fn name() -> &'static str {
        READINGS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            READINGS,
            " (
                id                            UUID PRIMARY KEY,
                question                      TEXT NOT NULL,
                spread_type                   TEXT,
                user_id                       TEXT,
                status                        TEXT NOT NULL,
                source_page                   TEXT,
                question_domain               TEXT,
                question_complexity           TEXT,
                question_summary              TEXT,
                auto_selected_spread          BOOLEAN,
                spread_reason                 TEXT,
                significator_card_id          TEXT,
                significator_selection_reason TEXT,
                spread_pattern_analysis       JSONB,
                current_step                  TEXT NOT NULL,
                interpretation                TEXT,
                interpretation_full_text      TEXT,
                interpretation_summary        TEXT,
                interpretation_metadata       JSONB,
                imagery_description           TEXT,
                error_message                 TEXT,
                created_at                    TIMESTAMPTZ NOT NULL,
                cards_selected_at             TIMESTAMPTZ,
                pattern_analyzed_at            TIMESTAMPTZ,
                imagery_generated_at           TIMESTAMPTZ,
                completed_at                   TIMESTAMPTZ
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            READINGS,
            "_user_id ON ",
            READINGS,
            " (user_id);
             CREATE INDEX IF NOT EXISTS idx_",
            READINGS,
            "_status ON ",
            READINGS,
            " (status);"
        )
    }
    fn truncates() -> &'static str {
        const_format::concatcp!("TRUNCATE TABLE ", READINGS, " CASCADE;")
    }
    fn copy() -> &'static str {
        unimplemented!("readings is written row-by-row through its lifecycle, not binary COPY")
    }
    fn columns() -> &'static [tokio_postgres::types::Type] {
        unimplemented!("readings is written row-by-row through its lifecycle, not binary COPY")
    }
}

/// One row per dealt card (spec §6 `reading_cards`).
pub struct ReadingCardsTable;

impl Schema for ReadingCardsTable {
    fn name() -> &'static str {
        READING_CARDS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            READING_CARDS,
            " (
                reading_id           UUID NOT NULL REFERENCES ",
            READINGS,
            " (id),
                card_id              TEXT NOT NULL,
                position             TEXT NOT NULL,
                position_order       SMALLINT NOT NULL,
                position_description TEXT,
                is_reversed          BOOLEAN NOT NULL,
                card_selected_at     TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (reading_id, position_order)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            READING_CARDS,
            "_reading_id ON ",
            READING_CARDS,
            " (reading_id);"
        )
    }
    fn truncates() -> &'static str {
        const_format::concatcp!("TRUNCATE TABLE ", READING_CARDS, ";")
    }
    fn copy() -> &'static str {
        unimplemented!("reading_cards is written once per reading, not binary COPY")
    }
    fn columns() -> &'static [tokio_postgres::types::Type] {
        unimplemented!("reading_cards is written once per reading, not binary COPY")
    }
}

/// One audit row per pipeline stage (spec §3 ProcessRow, §6 `reading_process_data`).
pub struct ReadingProcessDataTable;

impl Schema for ReadingProcessDataTable {
    fn name() -> &'static str {
        READING_PROCESS_DATA
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            READING_PROCESS_DATA,
            " (
                reading_id         UUID NOT NULL REFERENCES ",
            READINGS,
            " (id),
                step_name          TEXT NOT NULL,
                step_order         SMALLINT NOT NULL,
                input_data         JSONB NOT NULL,
                output_data        JSONB NOT NULL,
                prompt_content     TEXT,
                model_used         TEXT,
                temperature        REAL,
                processing_time_ms BIGINT NOT NULL,
                error_message      TEXT,
                recorded_at        TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (reading_id, step_order)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            READING_PROCESS_DATA,
            "_reading_id ON ",
            READING_PROCESS_DATA,
            " (reading_id);"
        )
    }
    fn truncates() -> &'static str {
        const_format::concatcp!("TRUNCATE TABLE ", READING_PROCESS_DATA, ";")
    }
    fn copy() -> &'static str {
        unimplemented!("reading_process_data is written once per stage, not binary COPY")
    }
    fn columns() -> &'static [tokio_postgres::types::Type] {
        unimplemented!("reading_process_data is written once per stage, not binary COPY")
    }
}
