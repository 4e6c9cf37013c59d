use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::Client;

use tarot_analysis::PatternAnalysis;
use tarot_analysis::QuestionAnalysis;
use tarot_cards::Card;
use tarot_cards::DealtCard;
use tarot_core::TarotError;
use tarot_core::ID;
use tarot_reading::Reading;
use tarot_reading::ReadingStore;

use crate::schema::READING_CARDS;
use crate::schema::READINGS;

fn persistence_error(detail: impl std::fmt::Display) -> TarotError {
    TarotError::Persistence { detail: detail.to_string() }
}

fn enum_str<T: serde::Serialize>(value: &T) -> Option<String> {
    serde_json::to_value(value).ok().and_then(|v| v.as_str().map(str::to_string))
}

/// Postgres-backed reading lifecycle (spec §6 `readings`/`reading_cards`).
pub struct PgReadingStore {
    client: Arc<Client>,
}

impl PgReadingStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn create(&self, reading: &Reading) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "INSERT INTO ",
            READINGS,
            " (id, question, user_id, status, source_page, current_step, created_at) ",
            "VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        self.client
            .execute(
                SQL,
                &[
                    &reading.id.inner(),
                    &reading.question,
                    &reading.user_id,
                    &reading.status.as_str(),
                    &reading.source_page,
                    &reading.current_step,
                    &reading.created_at,
                ],
            )
            .await
            .map_err(persistence_error)?;
        Ok(())
    }

    async fn save_question_analysis(&self, id: ID<Reading>, analysis: &QuestionAnalysis, spread_type: &str) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            READINGS,
            " SET spread_type = $2, status = 'card_selected', current_step = 'question_analyzed', ",
            "question_domain = $3, question_complexity = $4, question_summary = $5, ",
            "auto_selected_spread = $6, spread_reason = $7 WHERE id = $1"
        );
        self.client
            .execute(
                SQL,
                &[
                    &id.inner(),
                    &spread_type,
                    &enum_str(&analysis.domain),
                    &analysis.complexity.as_ref().and_then(enum_str),
                    &analysis.summary,
                    &analysis.auto_selected_spread,
                    &analysis.reasoning,
                ],
            )
            .await
            .map_err(persistence_error)?;
        Ok(())
    }

    async fn save_cards(&self, id: ID<Reading>, cards: &[DealtCard], significator: Option<(&Card, &str)>) -> Result<(), TarotError> {
        const INSERT_CARD: &str = const_format::concatcp!(
            "INSERT INTO ",
            READING_CARDS,
            " (reading_id, card_id, position, position_order, position_description, is_reversed, card_selected_at) ",
            "VALUES ($1, $2, $3, $4, $5, $6, NOW()) ",
            "ON CONFLICT (reading_id, position_order) DO UPDATE SET ",
            "card_id = EXCLUDED.card_id, is_reversed = EXCLUDED.is_reversed"
        );
        for card in cards {
            self.client
                .execute(
                    INSERT_CARD,
                    &[
                        &id.inner(),
                        &card.card.id,
                        &card.position,
                        &(card.position_order as i16),
                        &card.position_description,
                        &card.is_reversed,
                    ],
                )
                .await
                .map_err(persistence_error)?;
        }

        if let Some((card, reason)) = significator {
            const UPDATE_SIGNIFICATOR: &str = const_format::concatcp!(
                "UPDATE ",
                READINGS,
                " SET significator_card_id = $2, significator_selection_reason = $3, ",
                "cards_selected_at = NOW() WHERE id = $1"
            );
            self.client
                .execute(UPDATE_SIGNIFICATOR, &[&id.inner(), &card.id, &reason])
                .await
                .map_err(persistence_error)?;
        } else {
            const TOUCH_CARDS_SELECTED_AT: &str =
                const_format::concatcp!("UPDATE ", READINGS, " SET cards_selected_at = NOW() WHERE id = $1");
            self.client.execute(TOUCH_CARDS_SELECTED_AT, &[&id.inner()]).await.map_err(persistence_error)?;
        }
        Ok(())
    }

    async fn save_pattern_analysis(&self, id: ID<Reading>, analysis: &PatternAnalysis) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            READINGS,
            " SET spread_pattern_analysis = $2, pattern_analyzed_at = NOW(), ",
            "current_step = 'pattern_analyzed' WHERE id = $1"
        );
        let value = serde_json::to_value(analysis).map_err(|e| persistence_error(e))?;
        self.client.execute(SQL, &[&id.inner(), &value]).await.map_err(persistence_error)?;
        Ok(())
    }

    async fn save_imagery(&self, id: ID<Reading>, imagery: &str) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            READINGS,
            " SET imagery_description = $2, imagery_generated_at = NOW(), ",
            "current_step = 'imagery_generated' WHERE id = $1"
        );
        self.client.execute(SQL, &[&id.inner(), &imagery]).await.map_err(persistence_error)?;
        Ok(())
    }

    async fn complete(&self, id: ID<Reading>, interpretation: &str) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            READINGS,
            " SET interpretation = $2, status = 'completed', current_step = 'completed', ",
            "completed_at = NOW() WHERE id = $1"
        );
        self.client.execute(SQL, &[&id.inner(), &interpretation]).await.map_err(persistence_error)?;
        Ok(())
    }

    async fn fail(&self, id: ID<Reading>, error_message: &str) {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            READINGS,
            " SET status = 'error', current_step = 'error', error_message = $2 WHERE id = $1"
        );
        if let Err(e) = self.client.execute(SQL, &[&id.inner(), &error_message]).await {
            log::warn!("reading store: failed to persist failure for {id}: {e}");
        }
    }
}
