use serde::Serialize;

use super::card_dto::DealtCardDto;

/// One step of the `progress` event family (spec §6 wire table). Internally
/// tagged on `step` and flattened into the enclosing [`Event::Progress`]
/// object, so the wire form always carries both `type` and `step`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProgressStep {
    Started {
        reading_id: String,
    },
    QuestionAnalysis {
        question_analysis: serde_json::Value,
        spread_type: String,
    },
    CardsSelected {
        cards: Vec<DealtCardDto>,
        significator: Option<DealtCardDto>,
    },
    PatternAnalyzed {
        pattern_analysis: serde_json::Value,
    },
    RagCardProgress {
        /// `completed / total`, in `[0.0, 1.0]`.
        progress: f32,
        completed_cards: usize,
        total_cards: usize,
        card_id: String,
        card_name: String,
    },
    RagFirstCardReady {
        completed_cards: usize,
        total_cards: usize,
    },
    RagRetrieved {},
    ImageryGenerated {
        imagery_description: String,
    },
    InterpretationStarted {},
}

/// Messages streamed from the orchestrator to the client over SSE (spec §6
/// External interfaces).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Progress {
        #[serde(flatten)]
        step: ProgressStep,
        message: String,
    },
    ImageryChunk {
        text: String,
    },
    Interpretation {
        text: String,
    },
    Complete {
        reading_id: String,
        question: String,
        spread_type: String,
        total_time_ms: u64,
        message: String,
    },
    Error {
        error: String,
        reading_id: Option<String>,
    },
}

impl Event {
    pub fn started(reading_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::progress(ProgressStep::Started { reading_id: reading_id.into() }, message)
    }

    pub fn question_analysis(
        question_analysis: serde_json::Value,
        spread_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::progress(
            ProgressStep::QuestionAnalysis {
                question_analysis,
                spread_type: spread_type.into(),
            },
            message,
        )
    }

    pub fn cards_selected(
        cards: Vec<DealtCardDto>,
        significator: Option<DealtCardDto>,
        message: impl Into<String>,
    ) -> Self {
        Self::progress(ProgressStep::CardsSelected { cards, significator }, message)
    }

    pub fn pattern_analyzed(pattern_analysis: serde_json::Value, message: impl Into<String>) -> Self {
        Self::progress(ProgressStep::PatternAnalyzed { pattern_analysis }, message)
    }

    pub fn rag_card_progress(
        completed_cards: usize,
        total_cards: usize,
        card_id: impl Into<String>,
        card_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let progress = if total_cards == 0 { 0.0 } else { completed_cards as f32 / total_cards as f32 };
        Self::progress(
            ProgressStep::RagCardProgress {
                progress,
                completed_cards,
                total_cards,
                card_id: card_id.into(),
                card_name: card_name.into(),
            },
            message,
        )
    }

    pub fn rag_first_card_ready(completed_cards: usize, total_cards: usize, message: impl Into<String>) -> Self {
        Self::progress(ProgressStep::RagFirstCardReady { completed_cards, total_cards }, message)
    }

    pub fn rag_retrieved(message: impl Into<String>) -> Self {
        Self::progress(ProgressStep::RagRetrieved {}, message)
    }

    pub fn imagery_chunk(text: impl Into<String>) -> Self {
        Self::ImageryChunk { text: text.into() }
    }

    pub fn imagery_generated(imagery_description: impl Into<String>, message: impl Into<String>) -> Self {
        Self::progress(
            ProgressStep::ImageryGenerated { imagery_description: imagery_description.into() },
            message,
        )
    }

    pub fn interpretation_started(message: impl Into<String>) -> Self {
        Self::progress(ProgressStep::InterpretationStarted {}, message)
    }

    pub fn interpretation(text: impl Into<String>) -> Self {
        Self::Interpretation { text: text.into() }
    }

    pub fn complete(
        reading_id: impl Into<String>,
        question: impl Into<String>,
        spread_type: impl Into<String>,
        total_time_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::Complete {
            reading_id: reading_id.into(),
            question: question.into(),
            spread_type: spread_type.into(),
            total_time_ms,
            message: message.into(),
        }
    }

    pub fn error(error: impl Into<String>, reading_id: Option<String>) -> Self {
        Self::Error { error: error.into(), reading_id }
    }

    fn progress(step: ProgressStep, message: impl Into<String>) -> Self {
        Self::Progress { step, message: message.into() }
    }

    /// Renders this event as a single `data: ...\n\n` SSE frame.
    pub fn to_sse(&self) -> String {
        let json = serde_json::to_string(self).expect("serialize reading event");
        format!("data: {json}\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_event_serializes_with_type_and_step() {
        let event = Event::started("r-1", "开始占卜...");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"step\":\"started\""));
        assert!(json.contains("开始占卜"));
    }

    #[test]
    fn rag_card_progress_computes_ratio() {
        let event = Event::rag_card_progress(3, 10, "c1", "The Fool", "drawing on the lore");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"progress\":0.3"));
        assert!(json.contains("\"completed_cards\":3"));
    }

    #[test]
    fn to_sse_wraps_in_data_frame() {
        let event = Event::error("deck too small", None);
        let frame = event.to_sse();
        assert!(frame.starts_with("data: "));
        assert!(frame.ends_with("\n\n"));
    }

    #[test]
    fn complete_event_has_no_step_field() {
        let event = Event::complete("r-1", "q", "three_card", 1200, "done");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"complete\""));
        assert!(!json.contains("\"step\""));
    }
}
