use async_trait::async_trait;
use tarot_analysis::PatternAnalysis;
use tarot_analysis::QuestionAnalysis;
use tarot_cards::Card;
use tarot_cards::DealtCard;
use tarot_core::TarotError;
use tarot_core::ID;

use crate::reading::Reading;

/// Persists a reading's lifecycle (spec §6 `readings`/`reading_cards`
/// tables). Earlier-stage writes propagate failures to the orchestrator;
/// only the audit trail (`AuditSink`) and this trait's own `fail` path are
/// best-effort (spec §7 ErrPersistence).
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn create(&self, reading: &Reading) -> Result<(), TarotError>;

    async fn save_question_analysis(
        &self,
        id: ID<Reading>,
        analysis: &QuestionAnalysis,
        spread_type: &str,
    ) -> Result<(), TarotError>;

    async fn save_cards(
        &self,
        id: ID<Reading>,
        cards: &[DealtCard],
        significator: Option<(&Card, &str)>,
    ) -> Result<(), TarotError>;

    async fn save_pattern_analysis(&self, id: ID<Reading>, analysis: &PatternAnalysis) -> Result<(), TarotError>;

    async fn save_imagery(&self, id: ID<Reading>, imagery: &str) -> Result<(), TarotError>;

    /// Final `completed` write. Callers retry this once on failure (spec
    /// §7: "Reading-row writes retry once on the final `completed` update").
    async fn complete(&self, id: ID<Reading>, interpretation: &str) -> Result<(), TarotError>;

    /// Best-effort: failures here are logged, never propagated, since the
    /// reading is already terminating on another error.
    async fn fail(&self, id: ID<Reading>, error_message: &str);
}

/// A `ReadingStore` that only logs, used by tests and as a default when no
/// database is configured.
#[derive(Debug, Default)]
pub struct LoggingReadingStore;

#[async_trait]
impl ReadingStore for LoggingReadingStore {
    async fn create(&self, reading: &Reading) -> Result<(), TarotError> {
        log::debug!("reading store: create {}", reading.id);
        Ok(())
    }

    async fn save_question_analysis(
        &self,
        id: ID<Reading>,
        _analysis: &QuestionAnalysis,
        spread_type: &str,
    ) -> Result<(), TarotError> {
        log::debug!("reading store: {id} question analyzed, spread={spread_type}");
        Ok(())
    }

    async fn save_cards(
        &self,
        id: ID<Reading>,
        cards: &[DealtCard],
        significator: Option<(&Card, &str)>,
    ) -> Result<(), TarotError> {
        log::debug!(
            "reading store: {id} saved {} cards, significator={:?}",
            cards.len(),
            significator.map(|(c, _)| &c.name_en)
        );
        Ok(())
    }

    async fn save_pattern_analysis(&self, id: ID<Reading>, _analysis: &PatternAnalysis) -> Result<(), TarotError> {
        log::debug!("reading store: {id} pattern analysis saved");
        Ok(())
    }

    async fn save_imagery(&self, id: ID<Reading>, _imagery: &str) -> Result<(), TarotError> {
        log::debug!("reading store: {id} imagery saved");
        Ok(())
    }

    async fn complete(&self, id: ID<Reading>, _interpretation: &str) -> Result<(), TarotError> {
        log::debug!("reading store: {id} completed");
        Ok(())
    }

    async fn fail(&self, id: ID<Reading>, error_message: &str) {
        log::warn!("reading store: {id} failed: {error_message}");
    }
}
