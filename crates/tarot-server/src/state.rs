use std::sync::Arc;

use tarot_core::TarotError;
use tarot_rag::HttpModelClient;
use tarot_rag::RagIndex;
use tarot_reading::ReadingContext;

use crate::config::ReadingConfig;
use crate::preset::ModelPreset;

/// Process-wide state handed to every request (spec §9 "Global singletons
/// → context-carried handles", mirrored from `tarot_reading::ReadingContext`'s
/// own doc comment).
pub struct AppState {
    pub ctx: ReadingContext,
    pub db: Option<Arc<tokio_postgres::Client>>,
}

impl AppState {
    /// Connects to Postgres and wires real implementations; if the
    /// connection fails, falls back to in-memory/logging fixtures so the
    /// process still starts (spec §4.2 — a degraded status, not a crash).
    pub async fn build(config: &ReadingConfig) -> Self {
        let preset = ModelPreset::resolve(&config.model_preset);
        let (base_url, api_key) = config.provider();

        let question_model: Arc<dyn tarot_rag::ModelClient> = Arc::new(HttpModelClient::new(
            base_url,
            api_key,
            preset.question,
            config.embedding_model(),
            config.embedding_dimensions,
        ));
        let imagery_model: Arc<dyn tarot_rag::ModelClient> = Arc::new(HttpModelClient::new(
            base_url,
            api_key,
            preset.imagery,
            config.embedding_model(),
            config.embedding_dimensions,
        ));
        let interpretation_model: Arc<dyn tarot_rag::ModelClient> = Arc::new(HttpModelClient::new(
            base_url,
            api_key,
            preset.interpretation,
            config.embedding_model(),
            config.embedding_dimensions,
        ));
        let embedding_model: Arc<dyn tarot_rag::ModelClient> = Arc::new(HttpModelClient::new(
            base_url,
            api_key,
            preset.question,
            config.embedding_model(),
            config.embedding_dimensions,
        ));

        match tarot_database::connect(&config.database_url).await {
            Ok(client) => {
                let rag = Arc::new(RagIndex::new(embedding_model, Arc::new(tarot_database::PgVectorStore::new(client.clone()))));
                let ctx = ReadingContext::new(
                    rag,
                    question_model,
                    imagery_model,
                    interpretation_model,
                    Arc::new(tarot_database::PgDeckRepository::new(client.clone())),
                    Arc::new(tarot_database::PgAuditSink::new(client.clone())),
                    Arc::new(tarot_database::PgReadingStore::new(client.clone())),
                    config.default_source.clone(),
                );
                Self { ctx, db: Some(client) }
            }
            Err(e) => {
                log::error!("starting in degraded mode, database unavailable: {e}");
                let rag = Arc::new(RagIndex::new(embedding_model, Arc::new(tarot_rag::InMemoryVectorStore::new())));
                let ctx = ReadingContext::new(
                    rag,
                    question_model,
                    imagery_model,
                    interpretation_model,
                    Arc::new(tarot_cards::StaticDeckRepository),
                    Arc::new(tarot_reading::LoggingAuditSink),
                    Arc::new(tarot_reading::LoggingReadingStore),
                    config.default_source.clone(),
                );
                Self { ctx, db: None }
            }
        }
    }

    pub async fn health(&self) -> Result<(), TarotError> {
        match &self.db {
            Some(client) => tarot_database::health_check(client).await,
            None => Err(TarotError::Persistence { detail: "running without a database connection".to_string() }),
        }
    }
}
