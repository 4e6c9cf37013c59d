use super::suit::Arcana;
use super::suit::Suit;

/// An immutable corpus entity: one of the 78 cards for a named tarot source
/// (e.g. `"pkt"` or `"78degrees"`). See spec §3 Data model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Card {
    pub id: String,
    pub source: String,
    pub name_en: String,
    pub name_cn: Option<String>,
    /// `0..=21` for majors, `1..=14` for minors (1=Ace ... 14=King).
    pub number: u8,
    pub suit: Suit,
    pub arcana: Arcana,
    pub description: String,
    pub upright_meaning: String,
    pub reversed_meaning: String,
    /// Majors only.
    pub symbolic_meaning: Option<String>,
    /// Minors only.
    pub additional_meanings: Option<String>,
    pub image_url: Option<String>,
}

impl Card {
    pub fn is_court(&self) -> bool {
        self.arcana == Arcana::Minor && self.number >= 11
    }

    /// `"{CourtLevel} of {SuitTitleCase}"`, used by significator lookup.
    pub fn court_name(level: super::suit::CourtLevel, suit: Suit) -> String {
        format!("{level} of {}", suit.title_case())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(number: u8, suit: Suit, arcana: Arcana) -> Card {
        Card {
            id: "x".into(),
            source: "pkt".into(),
            name_en: "Test Card".into(),
            name_cn: None,
            number,
            suit,
            arcana,
            description: String::new(),
            upright_meaning: String::new(),
            reversed_meaning: String::new(),
            symbolic_meaning: None,
            additional_meanings: None,
            image_url: None,
        }
    }

    #[test]
    fn court_detection_requires_minor_and_number_at_least_11() {
        assert!(sample(14, Suit::Wands, Arcana::Minor).is_court());
        assert!(!sample(10, Suit::Wands, Arcana::Minor).is_court());
        assert!(!sample(14, Suit::Major, Arcana::Major).is_court());
    }

    #[test]
    fn court_name_formats_title_case_suit() {
        assert_eq!(
            Card::court_name(super::super::suit::CourtLevel::King, Suit::Wands),
            "King of Wands"
        );
    }
}
