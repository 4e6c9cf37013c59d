use tarot_analysis::PatternAnalysis;
use tarot_analysis::QuestionAnalysis;
use tarot_cards::DealtCard;
use tarot_core::TarotError;
use tarot_core::INTERPRETATION_CHUNK_CHARS;
use tarot_core::INTERPRETATION_MAX_CHUNKS;
use tarot_core::INTERPRETATION_TEMPERATURE;
use tarot_rag::ChatRequest;
use tarot_rag::ChatStream;
use tarot_rag::ModelClient;
use tarot_rag::ScoredChunk;

const STAGE: &str = "final_interpretation";

/// Output language for the final interpretation (spec §4.11 — "determined
/// by profile: `zh` → explicit Simplified Chinese, `en` → English").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLanguage {
    Chinese,
    English,
}

impl OutputLanguage {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("zh") => OutputLanguage::Chinese,
            _ => OutputLanguage::English,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OutputLanguage::Chinese => "Simplified Chinese",
            OutputLanguage::English => "English",
        }
    }
}

/// Streamed LLM synthesis of the final reading (spec §4.11 Interpreter).
/// Pure prompt assembly plus a `chatStream` call.
pub struct Interpreter;

impl Interpreter {
    #[allow(clippy::too_many_arguments)]
    pub async fn generate(
        model: &dyn ModelClient,
        question: &str,
        question_analysis: &QuestionAnalysis,
        cards: &[DealtCard],
        imagery: &str,
        pattern_analysis: &PatternAnalysis,
        chunks: &[ScoredChunk],
        language: OutputLanguage,
    ) -> Result<ChatStream, TarotError> {
        let prompt = build_prompt(question, question_analysis, cards, imagery, pattern_analysis, chunks, language);
        let request = ChatRequest {
            system: prompt,
            user: question.to_string(),
            temperature: INTERPRETATION_TEMPERATURE,
            json_mode: false,
        };
        model.chat_stream(STAGE, request).await
    }
}

fn build_prompt(
    question: &str,
    question_analysis: &QuestionAnalysis,
    cards: &[DealtCard],
    imagery: &str,
    pattern_analysis: &PatternAnalysis,
    chunks: &[ScoredChunk],
    language: OutputLanguage,
) -> String {
    let spread_text = cards
        .iter()
        .map(|d| {
            format!(
                "- {} ({}{}): {}",
                d.card.name_en,
                d.position,
                if d.is_reversed { ", reversed" } else { "" },
                d.meaning()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let pattern_json = serde_json::to_string_pretty(pattern_analysis).unwrap_or_default();

    let context = chunks
        .iter()
        .take(INTERPRETATION_MAX_CHUNKS)
        .map(|c| format!("[{} sim={:.2}] {}", c.chunk.source, c.similarity, truncate_chars(&c.chunk.text, INTERPRETATION_CHUNK_CHARS)))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert tarot reader. Respond in {}.\n\n\
         Querent's question: {question}\n\
         Question analysis: domain={:?}, type={:?}, reasoning={}\n\n\
         Spread:\n{spread_text}\n\n\
         Imagery synthesis:\n{imagery}\n\n\
         Structural pattern analysis (JSON, scaffolding only — do not quote verbatim):\n{pattern_json}\n\n\
         Retrieved reference material:\n{context}\n\n\
         Write a cohesive, grounded interpretation that answers the question, weaving in the \
         spread, the imagery, the patterns, and the reference material where relevant.",
        language.label(),
        question_analysis.domain,
        question_analysis.question_type,
        question_analysis.reasoning,
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_english() {
        assert_eq!(OutputLanguage::parse(None), OutputLanguage::English);
        assert_eq!(OutputLanguage::parse(Some("en")), OutputLanguage::English);
        assert_eq!(OutputLanguage::parse(Some("zh")), OutputLanguage::Chinese);
    }
}
