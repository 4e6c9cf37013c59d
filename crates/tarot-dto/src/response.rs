use serde::Serialize;

use super::card_dto::DealtCardDto;

/// The persisted shape of a completed reading, returned by `GET
/// /readings/{id}` once the SSE stream has finished (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct ReadingResponse {
    pub id: String,
    pub question: String,
    pub spread: String,
    pub significator: Option<DealtCardDto>,
    pub cards: Vec<DealtCardDto>,
    pub imagery: String,
    pub interpretation: String,
    pub created_at: String,
}
