use async_trait::async_trait;
use tarot_core::TarotError;
use tarot_core::DECK_SIZE;
use tarot_core::MAJOR_ARCANA_COUNT;
use tarot_core::MINOR_SUIT_COUNT;

use super::card::Card;
use super::suit::Arcana;
use super::suit::CourtLevel;
use super::suit::Suit;

/// Reads the 78-card corpus for a named source. Concrete implementations
/// (e.g. a Postgres-backed one in `tarot-database`) own the actual storage;
/// this crate only describes the interface the selection engine consumes
/// (spec §4.4 `DeckRepository.load`).
#[async_trait]
pub trait DeckRepository: Send + Sync {
    async fn load(&self, source: &str) -> Result<Vec<Card>, TarotError>;
}

const MAJOR_NAMES: [&str; MAJOR_ARCANA_COUNT] = [
    "The Fool",
    "The Magician",
    "The High Priestess",
    "The Empress",
    "The Emperor",
    "The Hierophant",
    "The Lovers",
    "The Chariot",
    "Strength",
    "The Hermit",
    "Wheel of Fortune",
    "Justice",
    "The Hanged Man",
    "Death",
    "Temperance",
    "The Devil",
    "The Tower",
    "The Star",
    "The Moon",
    "The Sun",
    "Judgement",
    "The World",
];

/// Deterministic, dependency-free corpus generator. Used as the default
/// fixture in tests and examples; production deployments should supply a
/// `DeckRepository` backed by the real corpus (`tarot-database::PgDeckRepository`).
#[derive(Debug, Clone, Default)]
pub struct StaticDeckRepository;

impl StaticDeckRepository {
    pub fn build(source: &str) -> Vec<Card> {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for (number, name) in MAJOR_NAMES.iter().enumerate() {
            cards.push(Card {
                id: format!("{source}-major-{number}"),
                source: source.to_string(),
                name_en: name.to_string(),
                name_cn: None,
                number: number as u8,
                suit: Suit::Major,
                arcana: Arcana::Major,
                description: format!("{name}: a major arcana archetype."),
                upright_meaning: format!("{name} upright."),
                reversed_meaning: format!("{name} reversed."),
                symbolic_meaning: Some(format!("{name} symbolism.")),
                additional_meanings: None,
                image_url: None,
            });
        }
        for suit in Suit::MINOR_SUITS {
            for number in 1..=MINOR_SUIT_COUNT as u8 {
                let name = minor_name(number, suit);
                cards.push(Card {
                    id: format!("{source}-{}-{number}", suit),
                    source: source.to_string(),
                    name_en: name.clone(),
                    name_cn: None,
                    number,
                    suit,
                    arcana: Arcana::Minor,
                    description: format!("{name}: a minor arcana card."),
                    upright_meaning: format!("{name} upright."),
                    reversed_meaning: format!("{name} reversed."),
                    symbolic_meaning: None,
                    additional_meanings: Some(format!("{name} additional meanings.")),
                    image_url: None,
                });
            }
        }
        cards
    }
}

fn minor_name(number: u8, suit: Suit) -> String {
    let rank = match number {
        1 => "Ace".to_string(),
        2..=10 => number.to_string(),
        11 => CourtLevel::Page.to_string(),
        12 => CourtLevel::Knight.to_string(),
        13 => CourtLevel::Queen.to_string(),
        14 => CourtLevel::King.to_string(),
        _ => unreachable!("minor card numbers are 1..=14"),
    };
    format!("{rank} of {}", suit.title_case())
}

#[async_trait]
impl DeckRepository for StaticDeckRepository {
    async fn load(&self, source: &str) -> Result<Vec<Card>, TarotError> {
        let cards = Self::build(source);
        if cards.len() != DECK_SIZE {
            return Err(TarotError::CorpusIncomplete {
                source: source.to_string(),
                found: cards.len(),
            });
        }
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_corpus_has_exactly_78_cards() {
        let cards = StaticDeckRepository.load("pkt").await.unwrap();
        assert_eq!(cards.len(), DECK_SIZE);
        let majors = cards.iter().filter(|c| c.arcana == Arcana::Major).count();
        assert_eq!(majors, MAJOR_ARCANA_COUNT);
        for suit in Suit::MINOR_SUITS {
            let count = cards.iter().filter(|c| c.suit == suit).count();
            assert_eq!(count, MINOR_SUIT_COUNT);
        }
    }

    #[tokio::test]
    async fn king_of_wands_is_present_for_significator_lookup() {
        let cards = StaticDeckRepository.load("pkt").await.unwrap();
        assert!(cards.iter().any(|c| c.name_en == "King of Wands"));
    }
}
