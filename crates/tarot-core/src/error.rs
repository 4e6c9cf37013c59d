use std::fmt;

/// Top-level error union for the reading pipeline, matching the Error kinds
/// table in spec §7 one-to-one. Domain crates define their own narrower
/// error enums and convert into this one at the orchestrator boundary.
#[derive(Debug, Clone)]
pub enum TarotError {
    /// Deck load returned a count other than 78. Fatal for the reading.
    CorpusIncomplete { source: String, found: usize },
    /// Spread name has no known position list. Fatal for the reading.
    UnknownSpread { spread: String },
    /// Significator id did not match any card in the loaded deck.
    SignificatorNotInDeck { card_id: String },
    /// No significator card could be resolved in the given corpus.
    SignificatorMissing { source: String },
    /// Fewer cards remained than the spread required after significator removal.
    DeckTooSmall { needed: usize, available: usize },
    /// The underlying model provider failed.
    LlmCall { stage: String, detail: String },
    /// A structured LLM stage returned unparseable output after its retry.
    LlmParse { stage: String, detail: String },
    /// The vector store failed to answer a query; treated as zero hits by callers.
    VectorSearch { detail: String },
    /// A database write failed outside the best-effort audit path.
    Persistence { detail: String },
}

impl fmt::Display for TarotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorpusIncomplete { source, found } => write!(
                f,
                "corpus '{source}' is incomplete: expected 78 cards, found {found}"
            ),
            Self::UnknownSpread { spread } => write!(f, "unknown spread '{spread}'"),
            Self::SignificatorNotInDeck { card_id } => {
                write!(f, "significator card {card_id} not found in deck")
            }
            Self::SignificatorMissing { source } => {
                write!(f, "no significator card available in corpus '{source}'")
            }
            Self::DeckTooSmall { needed, available } => write!(
                f,
                "deck too small: spread needs {needed} cards, {available} available"
            ),
            Self::LlmCall { stage, detail } => write!(f, "model call failed at {stage}: {detail}"),
            Self::LlmParse { stage, detail } => {
                write!(f, "could not parse model output at {stage}: {detail}")
            }
            Self::VectorSearch { detail } => write!(f, "vector search failed: {detail}"),
            Self::Persistence { detail } => write!(f, "persistence failed: {detail}"),
        }
    }
}

impl std::error::Error for TarotError {}
