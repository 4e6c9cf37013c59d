use tarot_core::TarotError;

use super::card::Card;
use super::suit::CourtLevel;
use super::suit::Suit;

/// Which source wins when more than one derivation could pick a suit
/// (spec §4.5 priority flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuitPriority {
    #[default]
    QuestionFirst,
    PersonalityFirst,
    ZodiacFirst,
}

impl SuitPriority {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "personality_first" => SuitPriority::PersonalityFirst,
            "zodiac_first" => SuitPriority::ZodiacFirst,
            _ => SuitPriority::QuestionFirst,
        }
    }
}

/// The querent details `SignificatorResolver` uses to pick a court card
/// (spec §4.5). Every field is optional — the resolver always produces a
/// card, falling back to King of Wands when nothing else is known.
#[derive(Debug, Clone, Default)]
pub struct SignificatorInput<'a> {
    pub age: Option<u8>,
    pub gender: Option<&'a str>,
    pub zodiac_sign: Option<&'a str>,
    /// Already a suit, if the querent stated a personality type directly.
    pub personality_suit: Option<Suit>,
    pub question_domain: Option<&'a str>,
    pub priority: SuitPriority,
}

/// Maps an elemental zodiac sign to its tarot element (spec §4.5).
fn zodiac_to_element(sign: &str) -> Option<&'static str> {
    match sign.to_ascii_lowercase().as_str() {
        "aries" | "leo" | "sagittarius" => Some("fire"),
        "taurus" | "virgo" | "capricorn" => Some("earth"),
        "gemini" | "libra" | "aquarius" => Some("air"),
        "cancer" | "scorpio" | "pisces" => Some("water"),
        _ => None,
    }
}

fn element_to_suit(element: &str) -> Suit {
    match element {
        "fire" => Suit::Wands,
        "water" => Suit::Cups,
        "air" => Suit::Swords,
        "earth" => Suit::Pentacles,
        _ => Suit::Wands,
    }
}

/// Maps a question domain to the suit most associated with it (spec §4.5).
fn question_domain_to_suit(domain: &str) -> Option<Suit> {
    match domain.to_ascii_lowercase().as_str() {
        "love" => Some(Suit::Cups),
        "career" => Some(Suit::Wands),
        "health" => Some(Suit::Pentacles),
        "finance" => Some(Suit::Pentacles),
        "personal_growth" => Some(Suit::Swords),
        "general" => Some(Suit::Wands),
        _ => None,
    }
}

/// Resolves the court card that stands in for the querent in a Celtic Cross
/// spread (spec §4.5). Rank comes from age/gender; suit comes from the
/// first non-null hit, in priority order, among question domain,
/// personality type, and zodiac element; reasoning is returned alongside
/// the card so callers can persist a reproducible audit string.
pub struct SignificatorResolver;

impl SignificatorResolver {
    pub fn resolve(
        deck: &[Card],
        input: &SignificatorInput<'_>,
    ) -> Result<(Card, String), TarotError> {
        let (level, level_reason) = Self::resolve_court_level(input);
        let (suit, suit_reason) = Self::resolve_suit(input);
        let name = Card::court_name(level, suit);

        let card = match deck.iter().find(|c| c.name_en == name).cloned() {
            Some(card) => card,
            None => deck
                .iter()
                .find(|c| c.name_en == "King of Wands")
                .cloned()
                .ok_or(TarotError::SignificatorMissing { source: name })?,
        };

        let reason = format!("{level_reason}; {suit_reason} -> {}", card.name_en);
        Ok((card, reason))
    }

    /// male<40 -> King, male>=40 -> Knight; female<40 -> Page, female>=40 ->
    /// Queen; anything else, or a missing age/gender, falls back to King.
    fn resolve_court_level(input: &SignificatorInput<'_>) -> (CourtLevel, String) {
        let (age, gender) = match (input.age, input.gender) {
            (Some(age), Some(gender)) => (age, gender.to_ascii_lowercase()),
            _ => {
                return (
                    CourtLevel::King,
                    "age or gender unknown, defaulting rank to King".to_string(),
                )
            }
        };
        match gender.as_str() {
            "male" if age < 40 => (CourtLevel::King, format!("male, age {age} < 40 -> King")),
            "male" => (CourtLevel::Knight, format!("male, age {age} >= 40 -> Knight")),
            "female" if age < 40 => (CourtLevel::Page, format!("female, age {age} < 40 -> Page")),
            "female" => (CourtLevel::Queen, format!("female, age {age} >= 40 -> Queen")),
            other => (
                CourtLevel::King,
                format!("gender '{other}' has no court mapping, defaulting to King"),
            ),
        }
    }

    fn resolve_suit(input: &SignificatorInput<'_>) -> (Suit, String) {
        let order: [&str; 3] = match input.priority {
            SuitPriority::QuestionFirst => ["question", "personality", "zodiac"],
            SuitPriority::PersonalityFirst => ["personality", "question", "zodiac"],
            SuitPriority::ZodiacFirst => ["zodiac", "question", "personality"],
        };
        for source in order {
            match source {
                "question" => {
                    if let Some(domain) = input.question_domain {
                        if let Some(suit) = question_domain_to_suit(domain) {
                            return (suit, format!("question domain '{domain}' -> {suit}"));
                        }
                    }
                }
                "personality" => {
                    if let Some(suit) = input.personality_suit {
                        return (suit, format!("personality type -> {suit}"));
                    }
                }
                "zodiac" => {
                    if let Some(sign) = input.zodiac_sign {
                        if let Some(element) = zodiac_to_element(sign) {
                            let suit = element_to_suit(element);
                            return (suit, format!("zodiac '{sign}' ({element}) -> {suit}"));
                        }
                    }
                }
                _ => unreachable!(),
            }
        }
        (
            Suit::Wands,
            "no suit signal available, defaulting to Wands".to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::StaticDeckRepository;

    fn deck() -> Vec<Card> {
        StaticDeckRepository::build("pkt")
    }

    #[test]
    fn no_input_falls_back_to_king_of_wands() {
        let deck = deck();
        let input = SignificatorInput::default();
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "King of Wands");
    }

    #[test]
    fn male_under_40_with_general_question_is_king_of_wands() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(28),
            gender: Some("male"),
            question_domain: Some("general"),
            ..Default::default()
        };
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "King of Wands");
    }

    #[test]
    fn female_over_40_with_love_question_is_queen_of_cups() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(45),
            gender: Some("female"),
            question_domain: Some("love"),
            ..Default::default()
        };
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "Queen of Cups");
    }

    #[test]
    fn male_under_40_is_king_regardless_of_suit() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(22),
            gender: Some("male"),
            question_domain: Some("health"),
            ..Default::default()
        };
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "King of Pentacles");
    }

    #[test]
    fn female_under_40_is_page() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(30),
            gender: Some("female"),
            question_domain: Some("personal_growth"),
            ..Default::default()
        };
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "Page of Swords");
    }

    #[test]
    fn question_domain_wins_over_zodiac_under_default_priority() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(28),
            gender: Some("male"),
            zodiac_sign: Some("gemini"),
            question_domain: Some("love"),
            priority: SuitPriority::QuestionFirst,
            ..Default::default()
        };
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "King of Cups");
    }

    #[test]
    fn zodiac_first_priority_overrides_question_domain() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(28),
            gender: Some("male"),
            zodiac_sign: Some("gemini"),
            question_domain: Some("love"),
            priority: SuitPriority::ZodiacFirst,
            ..Default::default()
        };
        let (card, _) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card.name_en, "King of Swords");
    }

    #[test]
    fn resolution_is_deterministic_across_calls() {
        let deck = deck();
        let input = SignificatorInput {
            age: Some(25),
            gender: Some("male"),
            zodiac_sign: Some("sagittarius"),
            question_domain: None,
            priority: SuitPriority::QuestionFirst,
            ..Default::default()
        };
        let (card1, reason1) = SignificatorResolver::resolve(&deck, &input).unwrap();
        let (card2, reason2) = SignificatorResolver::resolve(&deck, &input).unwrap();
        assert_eq!(card1.name_en, card2.name_en);
        assert_eq!(reason1, reason2);
    }
}
