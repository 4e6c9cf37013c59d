use tarot_analysis::QuestionDomain;
use tarot_cards::DealtCard;
use tarot_core::TarotError;
use tarot_core::IMAGERY_CHUNKS_PER_CARD;
use tarot_core::IMAGERY_CHUNK_CHARS;
use tarot_core::IMAGERY_TEMPERATURE;
use tarot_rag::ChatRequest;
use tarot_rag::ChatStream;
use tarot_rag::ModelClient;

use crate::retriever::CardOutcome;

const STAGE: &str = "imagery_description";

const FALLBACK: &str = "此次牌阵的画面尚无可用的视觉线索，塔罗师将仅凭牌义为你描绘整体意象。";

/// Either a token stream from the model, or the fixed fallback sentence used
/// when no visual-description chunks were retrieved (spec §4.11 — "if no
/// visual descriptions are found, it emits a fixed one-sentence fallback
/// without calling the model").
pub enum ImageryOutput {
    Fallback(String),
    Streamed(ChatStream),
}

/// Streamed LLM synthesis of a poetic description of the spread (spec §4.11
/// ImageryGenerator). Pure prompt assembly plus a `chatStream` call; no
/// retrieval happens here.
pub struct ImageryGenerator;

impl ImageryGenerator {
    pub async fn generate(
        model: &dyn ModelClient,
        cards: &[DealtCard],
        domain: Option<QuestionDomain>,
        per_card: &[CardOutcome],
    ) -> Result<ImageryOutput, TarotError> {
        let visual_snippets = collect_visual_snippets(per_card);
        if visual_snippets.is_empty() {
            return Ok(ImageryOutput::Fallback(FALLBACK.to_string()));
        }

        let prompt = build_prompt(cards, domain, &visual_snippets);
        let request = ChatRequest {
            system: prompt,
            user: "请据此为本次牌阵描绘一段意象。".to_string(),
            temperature: IMAGERY_TEMPERATURE,
            json_mode: false,
        };
        let stream = model.chat_stream(STAGE, request).await?;
        Ok(ImageryOutput::Streamed(stream))
    }
}

fn collect_visual_snippets(per_card: &[CardOutcome]) -> Vec<String> {
    let mut snippets = Vec::new();
    for outcome in per_card {
        for hit in outcome.visual.iter().take(IMAGERY_CHUNKS_PER_CARD) {
            let text = truncate_chars(&hit.chunk.text, IMAGERY_CHUNK_CHARS);
            snippets.push(format!("{}: {text}", outcome.card_name));
        }
    }
    snippets
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn build_prompt(cards: &[DealtCard], domain: Option<QuestionDomain>, visual_snippets: &[String]) -> String {
    let card_list = cards
        .iter()
        .map(|d| format!("- {} ({})", d.card.name_en, d.position))
        .collect::<Vec<_>>()
        .join("\n");
    let domain_str = domain.map(|d| d.as_str()).unwrap_or("general");
    format!(
        "你是一位塔罗牌意象画师。以下是本次牌阵：\n{card_list}\n\n问题领域：{domain_str}\n\n\
         以下是从典籍中检索到的视觉描述片段：\n{}\n\n\
         请用中文写一段连贯、富有画面感的描述，呈现这些牌面共同构成的意象。",
        visual_snippets.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_visual_snippets_caps_per_card() {
        use tarot_rag::RagChunk;
        use tarot_rag::ScoredChunk;
        let outcome = CardOutcome {
            card_id: "c1".to_string(),
            card_name: "The Fool".to_string(),
            merged: Vec::new(),
            visual: (0..5)
                .map(|i| ScoredChunk {
                    chunk: RagChunk {
                        id: format!("v{i}"),
                        text: "a cliff edge".to_string(),
                        source: "pkt".to_string(),
                        source_page: None,
                    },
                    similarity: 0.9,
                })
                .collect(),
        };
        let snippets = collect_visual_snippets(&[outcome]);
        assert_eq!(snippets.len(), IMAGERY_CHUNKS_PER_CARD);
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        let truncated = truncate_chars("héllo wörld", 5);
        assert_eq!(truncated.chars().count(), 5);
    }
}
