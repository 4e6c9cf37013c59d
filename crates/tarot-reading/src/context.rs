use std::sync::Arc;

use tarot_cards::DeckRepository;
use tarot_rag::ModelClient;
use tarot_rag::RagIndex;

use crate::process_row::AuditSink;
use crate::reading_store::ReadingStore;

/// Everything a reading needs that would otherwise be a process-wide global
/// singleton (spec §9 Design notes: "Global singletons → context-carried
/// handles"). Built once per process and cloned (cheaply, behind `Arc`) into
/// every reading task. Tests construct a different `ReadingContext` wired to
/// fakes instead of patching module-level statics.
///
/// Three distinct `ModelClient`s back the three LLM call sites (spec §6
/// config surface: "model preset ... resolving to {question-analysis model,
/// imagery model, final-interpretation model}"), since a single client binds
/// one model name at construction.
#[derive(Clone)]
pub struct ReadingContext {
    pub rag: Arc<RagIndex>,
    pub question_model: Arc<dyn ModelClient>,
    pub imagery_model: Arc<dyn ModelClient>,
    pub interpretation_model: Arc<dyn ModelClient>,
    pub deck_repo: Arc<dyn DeckRepository>,
    pub audit: Arc<dyn AuditSink>,
    pub reading_store: Arc<dyn ReadingStore>,
    /// Corpus source used when the caller doesn't name one (spec §6
    /// `preferredSource?`).
    pub default_source: String,
}

impl ReadingContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rag: Arc<RagIndex>,
        question_model: Arc<dyn ModelClient>,
        imagery_model: Arc<dyn ModelClient>,
        interpretation_model: Arc<dyn ModelClient>,
        deck_repo: Arc<dyn DeckRepository>,
        audit: Arc<dyn AuditSink>,
        reading_store: Arc<dyn ReadingStore>,
        default_source: impl Into<String>,
    ) -> Self {
        Self {
            rag,
            question_model,
            imagery_model,
            interpretation_model,
            deck_repo,
            audit,
            reading_store,
            default_source: default_source.into(),
        }
    }
}
