use tarot_core::TarotError;

/// A single named position within a spread's fixed layout (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub name: &'static str,
    pub order: usize,
    pub description: &'static str,
}

/// The supported spreads. `WorkCycle` is recognised only so
/// `QuestionAnalyzer` can recommend it; it has no position list and
/// reaching `CardSelector` with it is an error (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spread {
    ThreeCard,
    CelticCross,
}

impl Spread {
    pub fn parse(name: &str) -> Result<Self, TarotError> {
        match name {
            "three_card" => Ok(Spread::ThreeCard),
            "celtic_cross" => Ok(Spread::CelticCross),
            other => Err(TarotError::UnknownSpread {
                spread: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Spread::ThreeCard => "three_card",
            Spread::CelticCross => "celtic_cross",
        }
    }

    /// Whether this spread uses a significator (only Celtic Cross does).
    pub fn uses_significator(&self) -> bool {
        matches!(self, Spread::CelticCross)
    }

    pub fn positions(&self) -> &'static [Position] {
        match self {
            Spread::ThreeCard => &THREE_CARD_POSITIONS,
            Spread::CelticCross => &CELTIC_CROSS_POSITIONS,
        }
    }
}

static THREE_CARD_POSITIONS: [Position; 3] = [
    Position {
        name: "past",
        order: 1,
        description: "what led to this situation",
    },
    Position {
        name: "present",
        order: 2,
        description: "the current state of things",
    },
    Position {
        name: "future",
        order: 3,
        description: "where things are heading",
    },
];

static CELTIC_CROSS_POSITIONS: [Position; 10] = [
    Position {
        name: "cover",
        order: 1,
        description: "the heart of the matter",
    },
    Position {
        name: "crossing",
        order: 2,
        description: "the immediate challenge",
    },
    Position {
        name: "basis",
        order: 3,
        description: "the foundation of the situation",
    },
    Position {
        name: "behind",
        order: 4,
        description: "what is passing or receding",
    },
    Position {
        name: "crowned",
        order: 5,
        description: "the best outcome, or the conscious goal",
    },
    Position {
        name: "before",
        order: 6,
        description: "what is coming soon",
    },
    Position {
        name: "self",
        order: 7,
        description: "the querent's attitude",
    },
    Position {
        name: "environment",
        order: 8,
        description: "external influences",
    },
    Position {
        name: "hopes_and_fears",
        order: 9,
        description: "hopes and fears",
    },
    Position {
        name: "outcome",
        order: 10,
        description: "the likely final outcome",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_card_positions_are_past_present_future() {
        let names: Vec<_> = Spread::ThreeCard.positions().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["past", "present", "future"]);
    }

    #[test]
    fn celtic_cross_has_ten_ordered_positions() {
        let positions = Spread::CelticCross.positions();
        assert_eq!(positions.len(), 10);
        for (i, p) in positions.iter().enumerate() {
            assert_eq!(p.order, i + 1);
        }
    }

    #[test]
    fn unknown_spread_name_errors() {
        assert!(Spread::parse("work_cycle").is_err());
        assert!(Spread::parse("nonsense").is_err());
    }

    #[test]
    fn only_celtic_cross_uses_a_significator() {
        assert!(!Spread::ThreeCard.uses_significator());
        assert!(Spread::CelticCross.uses_significator());
    }
}
