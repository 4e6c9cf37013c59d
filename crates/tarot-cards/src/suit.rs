use std::fmt;

/// The five card suits. `Major` stands in for "no suit" on the major arcana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Major,
    Wands,
    Cups,
    Swords,
    Pentacles,
}

impl Suit {
    pub const MINOR_SUITS: [Suit; 4] = [Suit::Wands, Suit::Cups, Suit::Swords, Suit::Pentacles];

    pub fn title_case(&self) -> &'static str {
        match self {
            Suit::Major => "Major",
            Suit::Wands => "Wands",
            Suit::Cups => "Cups",
            Suit::Swords => "Swords",
            Suit::Pentacles => "Pentacles",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title_case().to_lowercase())
    }
}

impl std::str::FromStr for Suit {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Suit::Major),
            "wands" => Ok(Suit::Wands),
            "cups" => Ok(Suit::Cups),
            "swords" => Ok(Suit::Swords),
            "pentacles" => Ok(Suit::Pentacles),
            other => Err(format!("unknown suit '{other}'")),
        }
    }
}

/// Partition of the deck: 22 major-arcana archetypes, 56 minor-arcana
/// cards across four suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arcana {
    Major,
    Minor,
}

impl fmt::Display for Arcana {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arcana::Major => write!(f, "major"),
            Arcana::Minor => write!(f, "minor"),
        }
    }
}

/// Court levels used by minor-arcana face cards (numbers 11-14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourtLevel {
    Page,
    Knight,
    Queen,
    King,
}

impl fmt::Display for CourtLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CourtLevel::Page => "Page",
            CourtLevel::Knight => "Knight",
            CourtLevel::Queen => "Queen",
            CourtLevel::King => "King",
        };
        write!(f, "{s}")
    }
}

impl CourtLevel {
    /// Card number (within a minor suit) this court level occupies: 11-14.
    pub fn card_number(&self) -> u8 {
        match self {
            CourtLevel::Page => 11,
            CourtLevel::Knight => 12,
            CourtLevel::Queen => 13,
            CourtLevel::King => 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suit_round_trips_through_display_and_parse() {
        for suit in Suit::MINOR_SUITS {
            let parsed: Suit = suit.to_string().parse().unwrap();
            assert_eq!(parsed, suit);
        }
    }

    #[test]
    fn court_level_numbers_are_11_through_14() {
        assert_eq!(CourtLevel::Page.card_number(), 11);
        assert_eq!(CourtLevel::King.card_number(), 14);
    }
}
