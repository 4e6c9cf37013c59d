use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tarot_cards::Arcana;
use tarot_cards::DealtCard;
use tarot_cards::Suit;
use tarot_core::Similarity;
use tarot_core::CARD_QUERY_MIN_SIM;
use tarot_core::CARD_QUERY_TOP_K;
use tarot_core::CARD_VISUAL_MIN_SIM;
use tarot_core::CARD_VISUAL_TOP_K;
use tarot_core::CONTEXT_QUERY_MIN_SIM;
use tarot_core::CONTEXT_QUERY_TOP_K;
use tarot_rag::RagIndex;
use tarot_rag::ScoredChunk;
use tarot_dto::Event;
use tokio::sync::mpsc::UnboundedSender;

const STAGE: &str = "rag_retrieval";

/// Everything retrieved for one dealt card: the fused per-card list (three
/// queries, deduped by chunk id) and the visual-description hits kept
/// separately so `ImageryGenerator` can draw on them directly (spec §4.9,
/// §4.11).
#[derive(Debug, Clone)]
pub struct CardOutcome {
    pub card_id: String,
    pub card_name: String,
    pub merged: Vec<ScoredChunk>,
    pub visual: Vec<ScoredChunk>,
}

/// The background half of a fan-out: spread-method and relationship
/// queries, started after the per-card work finishes and joined later
/// during the imagery-streaming phase (spec §4.9, §4.10 step 7).
pub struct BackgroundRetrieval {
    handle: tokio::task::JoinHandle<(Vec<ScoredChunk>, Vec<ScoredChunk>)>,
}

impl BackgroundRetrieval {
    /// Returns `(spread_method_chunks, relationship_chunks)`. A panicking
    /// background task degrades to empty results rather than failing the
    /// whole reading.
    pub async fn join(self) -> (Vec<ScoredChunk>, Vec<ScoredChunk>) {
        self.handle.await.unwrap_or_else(|e| {
            log::error!("{STAGE}: background retrieval task panicked: {e}");
            (Vec::new(), Vec::new())
        })
    }
}

/// The fan-out/fan-in retrieval engine (spec §4.9 Retriever).
pub struct Retriever;

impl Retriever {
    /// Runs the per-card fan-out to completion, emitting `rag_card_progress`
    /// (and one `rag_first_card_ready`) as each card finishes, then spawns
    /// the spread-method and relationship queries as background work and
    /// returns immediately — this overlap is the retrieval step's main
    /// latency optimization (spec §4.9).
    pub async fn retrieve_per_card(rag: Arc<RagIndex>, cards: Vec<DealtCard>, progress: UnboundedSender<Event>) -> Vec<CardOutcome> {
        let total = cards.len();
        let mut tasks = FuturesUnordered::new();
        for dealt in &cards {
            let rag = Arc::clone(&rag);
            let dealt = dealt.clone();
            tasks.push(tokio::spawn(async move { per_card(&rag, &dealt).await }));
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut completed = 0usize;
        let mut first_ready_sent = false;
        let first_ready_threshold = (total / 10).max(1);

        while let Some(joined) = tasks.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("{STAGE}: per-card retrieval task panicked: {e}");
                    continue;
                }
            };
            completed += 1;
            let _ = progress.send(Event::rag_card_progress(
                completed,
                total,
                outcome.card_id.clone(),
                outcome.card_name.clone(),
                format!("drew on the lore for {}", outcome.card_name),
            ));
            if !first_ready_sent && completed >= first_ready_threshold {
                first_ready_sent = true;
                let _ = progress.send(Event::rag_first_card_ready(
                    completed,
                    total,
                    "first card's context is ready",
                ));
            }
            outcomes.push(outcome);
        }

        let _ = progress.send(Event::rag_retrieved("retrieval complete, synthesizing imagery"));

        outcomes
    }

    /// Spawns the spread-method (4 queries) and relationship (2-6 queries)
    /// fan-out as background work.
    pub fn spawn_background(rag: Arc<RagIndex>, cards: Vec<DealtCard>, spread_name: String) -> BackgroundRetrieval {
        let handle = tokio::spawn(async move {
            let spread_method = futures::future::join_all(
                spread_method_queries(&spread_name)
                    .into_iter()
                    .map(|q| search_balanced_or_empty(&rag, q)),
            )
            .await;
            let relationships = futures::future::join_all(
                relationship_queries(&cards)
                    .into_iter()
                    .map(|q| search_balanced_or_empty(&rag, q)),
            )
            .await;
            (
                dedup_by_chunk_id(spread_method.into_iter().flatten().collect()),
                dedup_by_chunk_id(relationships.into_iter().flatten().collect()),
            )
        });
        BackgroundRetrieval { handle }
    }
}

/// Merges per-card, spread-method, and relationship chunks into one
/// deduplicated, similarity-descending list for the interpretation prompt
/// (spec §3 RetrievalBundle, §4.9 second dedup pass).
pub fn merge_all(per_card: &[CardOutcome], spread_method: Vec<ScoredChunk>, relationships: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let mut all: Vec<ScoredChunk> = Vec::new();
    for outcome in per_card {
        all.extend(outcome.merged.iter().cloned());
    }
    all.extend(spread_method);
    all.extend(relationships);
    dedup_by_chunk_id(all)
}

async fn per_card(rag: &RagIndex, dealt: &DealtCard) -> CardOutcome {
    let card = &dealt.card;
    let orientation = if dealt.is_reversed { "reversed" } else { "upright" };
    let archetype = match card.arcana {
        Arcana::Major => card.symbolic_meaning.clone().unwrap_or_default(),
        Arcana::Minor => element_keyword(card.suit).to_string(),
    };
    let semantic_query = format!("{} {orientation} {archetype} {}", card.name_en, card.description);
    let visual_query = format!("{} visual imagery symbolism depicted in the card art", card.name_en);
    let position_query = format!(
        "{} meaning in the {} position: {}",
        card.name_en,
        dealt.position,
        dealt.meaning()
    );

    let (semantic, visual, position) = futures::join!(
        search_or_empty(rag, &semantic_query, CARD_QUERY_TOP_K, CARD_QUERY_MIN_SIM),
        search_or_empty(rag, &visual_query, CARD_VISUAL_TOP_K, CARD_VISUAL_MIN_SIM),
        search_or_empty(rag, &position_query, CARD_QUERY_TOP_K, CARD_QUERY_MIN_SIM),
    );

    let merged = dedup_by_chunk_id(semantic.into_iter().chain(visual.clone()).chain(position).collect());

    CardOutcome {
        card_id: card.id.clone(),
        card_name: card.name_en.clone(),
        merged,
        visual,
    }
}

fn element_keyword(suit: Suit) -> &'static str {
    match suit {
        Suit::Wands => "fire element keyword",
        Suit::Cups => "water element keyword",
        Suit::Swords => "air element keyword",
        Suit::Pentacles => "earth element keyword",
        Suit::Major => "",
    }
}

fn spread_method_queries(spread_name: &str) -> Vec<String> {
    vec![
        format!("{spread_name} spread steps how to lay out the cards"),
        format!("{spread_name} spread position interpretation guide"),
        format!("{spread_name} spread psychological background"),
        format!("{spread_name} spread traditional method origin"),
    ]
}

fn relationship_queries(cards: &[DealtCard]) -> Vec<String> {
    let mut queries = vec!["tarot number patterns numerology meaning across a spread".to_string()];

    if cards.iter().any(|d| d.card.arcana == Arcana::Minor) {
        queries.push("suit distribution elemental balance meaning".to_string());
    }
    if cards.iter().any(|d| d.card.arcana == Arcana::Major) {
        queries.push("major arcana dominance archetypal significance".to_string());
    }
    if cards.iter().any(|d| d.is_reversed) {
        queries.push("reversed card pattern meaning across a spread".to_string());
    }
    if cards.iter().filter(|d| d.card.is_court()).count() >= 2 {
        queries.push("court card combination relationship meaning".to_string());
    }
    queries.push("general card sequence relationship narrative".to_string());
    queries
}

async fn search_or_empty(rag: &RagIndex, query: &str, top_k: usize, min_sim: Similarity) -> Vec<ScoredChunk> {
    match rag.search(STAGE, query, top_k, min_sim).await {
        Ok(hits) => hits,
        Err(e) => {
            log::warn!("{STAGE}: query failed, treating as zero hits: {e}");
            Vec::new()
        }
    }
}

async fn search_balanced_or_empty(rag: &RagIndex, query: String) -> Vec<ScoredChunk> {
    match rag.search_balanced(STAGE, &query, CONTEXT_QUERY_TOP_K, CONTEXT_QUERY_MIN_SIM).await {
        Ok(hits) => hits,
        Err(e) => {
            log::warn!("{STAGE}: context query failed, treating as zero hits: {e}");
            Vec::new()
        }
    }
}

/// Deduplicates by chunk id, keeping the highest-similarity occurrence, and
/// sorts by similarity descending (spec §8 invariant 3).
fn dedup_by_chunk_id(chunks: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    use std::collections::HashMap;
    let mut best: HashMap<String, ScoredChunk> = HashMap::new();
    for scored in chunks {
        best.entry(scored.chunk.id.clone())
            .and_modify(|existing| {
                if scored.similarity > existing.similarity {
                    *existing = scored.clone();
                }
            })
            .or_insert(scored);
    }
    let mut merged: Vec<ScoredChunk> = best.into_values().collect();
    merged.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_rag::RagChunk;

    fn chunk(id: &str, similarity: Similarity) -> ScoredChunk {
        ScoredChunk {
            chunk: RagChunk {
                id: id.to_string(),
                text: "lore".to_string(),
                source: "pkt".to_string(),
                source_page: None,
            },
            similarity,
        }
    }

    #[test]
    fn dedup_keeps_highest_similarity_occurrence() {
        let merged = dedup_by_chunk_id(vec![chunk("a", 0.82), chunk("a", 0.91), chunk("b", 0.5)]);
        assert_eq!(merged.len(), 2);
        let a = merged.iter().find(|c| c.chunk.id == "a").unwrap();
        assert_eq!(a.similarity, 0.91);
    }

    #[test]
    fn dedup_sorts_by_similarity_descending() {
        let merged = dedup_by_chunk_id(vec![chunk("a", 0.2), chunk("b", 0.9), chunk("c", 0.5)]);
        let ids: Vec<_> = merged.iter().map(|c| c.chunk.id.clone()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn relationship_queries_always_include_number_and_sequence() {
        let queries = relationship_queries(&[]);
        assert_eq!(queries.len(), 2);
    }
}
