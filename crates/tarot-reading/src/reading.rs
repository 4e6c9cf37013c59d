use tarot_analysis::PatternAnalysis;
use tarot_analysis::QuestionAnalysis;
use tarot_cards::DealtCard;
use tarot_core::Unique;
use tarot_core::ID;

/// `pending → card_selected → completed`, or any state → `error` (spec §6
/// Status lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Pending,
    CardSelected,
    Completed,
    Error,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Pending => "pending",
            ReadingStatus::CardSelected => "card_selected",
            ReadingStatus::Completed => "completed",
            ReadingStatus::Error => "error",
        }
    }
}

/// Marker type for `ID<Reading>` — never instantiated.
pub struct Reading {
    pub id: ID<Reading>,
    pub question: String,
    pub user_id: Option<String>,
    pub source_page: Option<String>,
    pub spread_type: Option<String>,
    pub status: ReadingStatus,
    pub current_step: String,

    pub question_analysis: Option<QuestionAnalysis>,
    pub significator: Option<DealtCard>,
    pub significator_reason: Option<String>,
    pub cards: Vec<DealtCard>,
    pub pattern_analysis: Option<PatternAnalysis>,
    pub imagery: Option<String>,
    pub interpretation: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Unique<Reading> for Reading {
    fn id(&self) -> ID<Reading> {
        self.id
    }
}

impl Reading {
    /// A brand-new reading in `pending` status, created the moment a request
    /// is accepted (spec §4.10 step 1 `started`).
    pub fn new(question: impl Into<String>, user_id: Option<String>, source_page: Option<String>) -> Self {
        Self {
            id: ID::default(),
            question: question.into(),
            user_id,
            source_page,
            spread_type: None,
            status: ReadingStatus::Pending,
            current_step: "started".to_string(),
            question_analysis: None,
            significator: None,
            significator_reason: None,
            cards: Vec::new(),
            pattern_analysis: None,
            imagery: None,
            interpretation: None,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn mark_cards_selected(&mut self, spread_type: String, cards: Vec<DealtCard>) {
        self.spread_type = Some(spread_type);
        self.cards = cards;
        self.status = ReadingStatus::CardSelected;
        self.current_step = "cards_selected".to_string();
    }

    pub fn mark_completed(&mut self, interpretation: String) {
        self.interpretation = Some(interpretation);
        self.status = ReadingStatus::Completed;
        self.current_step = "completed".to_string();
    }

    pub fn mark_error(&mut self, message: String) {
        self.interpretation = Some(message);
        self.status = ReadingStatus::Error;
        self.current_step = "error".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reading_is_pending() {
        let reading = Reading::new("will it rain", None, None);
        assert_eq!(reading.status, ReadingStatus::Pending);
        assert!(reading.cards.is_empty());
    }

    #[test]
    fn mark_completed_sets_status_and_interpretation() {
        let mut reading = Reading::new("q", None, None);
        reading.mark_completed("the stars align".to_string());
        assert_eq!(reading.status, ReadingStatus::Completed);
        assert_eq!(reading.interpretation.as_deref(), Some("the stars align"));
    }
}
