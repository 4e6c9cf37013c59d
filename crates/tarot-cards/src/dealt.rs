use super::card::Card;

/// A card as it landed in a spread: which position, what order, and whether
/// it fell reversed (spec §3 DealtCard).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DealtCard {
    pub card: Card,
    pub position: String,
    pub position_order: usize,
    pub position_description: Option<String>,
    pub is_reversed: bool,
}

impl DealtCard {
    /// The meaning text relevant to this card's orientation.
    pub fn meaning(&self) -> &str {
        if self.is_reversed {
            &self.card.reversed_meaning
        } else {
            &self.card.upright_meaning
        }
    }
}
