use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::Client;

use tarot_cards::Arcana;
use tarot_cards::Card;
use tarot_cards::DeckRepository;
use tarot_cards::Suit;
use tarot_core::TarotError;
use tarot_core::DECK_SIZE;

/// Postgres-backed corpus (spec §4.4 `DeckRepository.load`).
pub struct PgDeckRepository {
    client: Arc<Client>,
}

impl PgDeckRepository {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Upserts one card, keyed by `(source, card_name_en)` (spec §6 uniqueness).
    pub async fn upsert(&self, card: &Card) -> Result<(), TarotError> {
        const SQL: &str = const_format::concatcp!(
            "INSERT INTO ",
            crate::schema::TAROT_CARDS,
            " (id, source, card_name_en, card_name_cn, card_number, suit, arcana, ",
            "description, upright_meaning, reversed_meaning, symbolic_meaning, ",
            "additional_meanings, image_url) ",
            "VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) ",
            "ON CONFLICT (source, card_name_en) DO UPDATE SET ",
            "card_name_cn = EXCLUDED.card_name_cn, ",
            "description = EXCLUDED.description, ",
            "upright_meaning = EXCLUDED.upright_meaning, ",
            "reversed_meaning = EXCLUDED.reversed_meaning, ",
            "symbolic_meaning = EXCLUDED.symbolic_meaning, ",
            "additional_meanings = EXCLUDED.additional_meanings, ",
            "image_url = EXCLUDED.image_url"
        );
        self.client
            .execute(
                SQL,
                &[
                    &card.id,
                    &card.source,
                    &card.name_en,
                    &card.name_cn,
                    &(card.number as i16),
                    &card.suit.to_string(),
                    &card.arcana.to_string(),
                    &card.description,
                    &card.upright_meaning,
                    &card.reversed_meaning,
                    &card.symbolic_meaning,
                    &card.additional_meanings,
                    &card.image_url,
                ],
            )
            .await
            .map_err(|e| TarotError::Persistence { detail: e.to_string() })?;
        Ok(())
    }
}

fn parse_arcana(raw: &str) -> Arcana {
    match raw {
        "major" => Arcana::Major,
        _ => Arcana::Minor,
    }
}

#[async_trait]
impl DeckRepository for PgDeckRepository {
    async fn load(&self, source: &str) -> Result<Vec<Card>, TarotError> {
        const SQL: &str = const_format::concatcp!(
            "SELECT id, source, card_name_en, card_name_cn, card_number, suit, arcana, ",
            "description, upright_meaning, reversed_meaning, symbolic_meaning, ",
            "additional_meanings, image_url FROM ",
            crate::schema::TAROT_CARDS,
            " WHERE source = $1"
        );
        let rows = self
            .client
            .query(SQL, &[&source])
            .await
            .map_err(|e| TarotError::Persistence { detail: e.to_string() })?;

        let cards: Vec<Card> = rows
            .into_iter()
            .map(|row| {
                let suit: String = row.get(5);
                let arcana: String = row.get(6);
                Card {
                    id: row.get(0),
                    source: row.get(1),
                    name_en: row.get(2),
                    name_cn: row.get(3),
                    number: row.get::<_, i16>(4) as u8,
                    suit: suit.parse::<Suit>().unwrap_or(Suit::Major),
                    arcana: parse_arcana(&arcana),
                    description: row.get(7),
                    upright_meaning: row.get(8),
                    reversed_meaning: row.get(9),
                    symbolic_meaning: row.get(10),
                    additional_meanings: row.get(11),
                    image_url: row.get(12),
                }
            })
            .collect();

        if cards.len() != DECK_SIZE {
            return Err(TarotError::CorpusIncomplete { source: source.to_string(), found: cards.len() });
        }
        Ok(cards)
    }
}
