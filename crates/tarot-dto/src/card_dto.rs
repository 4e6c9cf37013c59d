use serde::Serialize;
use tarot_cards::DealtCard;

/// A dealt card on the wire, flattened from [`DealtCard`] plus the meaning
/// text for its fallen orientation.
#[derive(Debug, Clone, Serialize)]
pub struct DealtCardDto {
    pub id: String,
    pub name: String,
    pub name_cn: Option<String>,
    pub suit: String,
    pub position: String,
    pub position_order: usize,
    pub position_description: Option<String>,
    pub is_reversed: bool,
    pub meaning: String,
    pub image_url: Option<String>,
}

impl From<&DealtCard> for DealtCardDto {
    fn from(dealt: &DealtCard) -> Self {
        Self {
            id: dealt.card.id.clone(),
            name: dealt.card.name_en.clone(),
            name_cn: dealt.card.name_cn.clone(),
            suit: dealt.card.suit.to_string(),
            position: dealt.position.clone(),
            position_order: dealt.position_order,
            position_description: dealt.position_description.clone(),
            is_reversed: dealt.is_reversed,
            meaning: dealt.meaning().to_string(),
            image_url: dealt.card.image_url.clone(),
        }
    }
}
