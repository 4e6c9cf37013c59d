use rand::seq::SliceRandom;
use rand::Rng;
use tarot_core::TarotError;
use tarot_core::CUT_COUNT;
use tarot_core::REVERSAL_PROBABILITY;

use super::card::Card;
use super::corpus::DeckRepository;
use super::dealt::DealtCard;
use super::spread::Spread;

/// Deck shuffle/cut/reversal/assignment to spread positions (spec §4.4).
pub struct CardSelector;

impl CardSelector {
    /// Deals a spread.
    ///
    /// 1. Loads the 78-card deck for `source`.
    /// 2. Removes the significator (Celtic Cross only), if one was given.
    /// 3. Shuffles uniformly (Fisher-Yates via `rng`).
    /// 4. Assigns reversal independently per card with probability 0.45.
    /// 5. Rotates the deck by three random "cuts".
    /// 6. Takes the spread's positions off the top, in order.
    pub async fn deal<R: Rng + ?Sized>(
        repo: &dyn DeckRepository,
        source: &str,
        spread: Spread,
        significator: Option<&Card>,
        rng: &mut R,
    ) -> Result<Vec<DealtCard>, TarotError> {
        let mut deck = repo.load(source).await?;

        if spread.uses_significator() {
            if let Some(sig) = significator {
                let before = deck.len();
                deck.retain(|c| c.id != sig.id);
                if deck.len() == before {
                    return Err(TarotError::SignificatorNotInDeck {
                        card_id: sig.id.clone(),
                    });
                }
            }
        }

        deck.shuffle(rng);

        let mut dealt: Vec<(Card, bool)> = deck
            .into_iter()
            .map(|card| {
                let reversed = rng.random_bool(REVERSAL_PROBABILITY);
                (card, reversed)
            })
            .collect();

        for _ in 0..CUT_COUNT {
            let len = dealt.len();
            if len == 0 {
                break;
            }
            let lo = len / 4;
            let hi = (3 * len / 4).max(lo);
            let cut = rng.random_range(lo..=hi);
            dealt.rotate_left(cut.min(len.saturating_sub(1)).max(0));
        }

        let positions = spread.positions();
        if dealt.len() < positions.len() {
            return Err(TarotError::DeckTooSmall {
                needed: positions.len(),
                available: dealt.len(),
            });
        }

        let result = positions
            .iter()
            .zip(dealt.into_iter())
            .map(|(pos, (card, is_reversed))| DealtCard {
                card,
                position: pos.name.to_string(),
                position_order: pos.order,
                position_description: Some(pos.description.to_string()),
                is_reversed,
            })
            .collect();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::StaticDeckRepository;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[tokio::test]
    async fn three_card_deal_uses_78_card_deck_and_no_significator() {
        let mut rng = SmallRng::seed_from_u64(7);
        let dealt = CardSelector::deal(
            &StaticDeckRepository,
            "pkt",
            Spread::ThreeCard,
            None,
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(dealt.len(), 3);
        let orders: Vec<_> = dealt.iter().map(|d| d.position_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn celtic_cross_with_significator_deals_from_77_cards_and_excludes_it() {
        let repo = StaticDeckRepository;
        let deck = repo.load("pkt").await.unwrap();
        let significator = deck
            .iter()
            .find(|c| c.name_en == "King of Wands")
            .cloned()
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        let dealt = CardSelector::deal(
            &repo,
            "pkt",
            Spread::CelticCross,
            Some(&significator),
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(dealt.len(), 10);
        assert!(dealt.iter().all(|d| d.card.id != significator.id));
    }

    #[tokio::test]
    async fn missing_significator_id_is_an_error() {
        let mut rng = SmallRng::seed_from_u64(3);
        let ghost = Card {
            id: "does-not-exist".into(),
            source: "pkt".into(),
            name_en: "Ghost".into(),
            name_cn: None,
            number: 0,
            suit: crate::suit::Suit::Major,
            arcana: crate::suit::Arcana::Major,
            description: String::new(),
            upright_meaning: String::new(),
            reversed_meaning: String::new(),
            symbolic_meaning: None,
            additional_meanings: None,
            image_url: None,
        };
        let result = CardSelector::deal(
            &StaticDeckRepository,
            "pkt",
            Spread::CelticCross,
            Some(&ghost),
            &mut rng,
        )
        .await;
        assert!(matches!(
            result,
            Err(TarotError::SignificatorNotInDeck { .. })
        ));
    }
}
