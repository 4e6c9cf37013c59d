use std::collections::HashMap;
use tarot_cards::Arcana;
use tarot_cards::DealtCard;
use tarot_cards::Suit;

/// `{timeFlow, causalRelationships, supportConflict}` (spec §3, §4.7).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PositionRelationships {
    pub time_flow: String,
    pub causal_relationships: Vec<String>,
    pub support_conflict: String,
}

/// `{sameNumbers, sequences, jumps}` (spec §3, §4.7).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct NumberPatterns {
    pub same_numbers: Vec<String>,
    pub sequences: Vec<String>,
    pub jumps: Vec<String>,
}

/// Per-suit counts plus a one-sentence interpretation of the dominant
/// category (spec §3, §4.7).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SuitDistribution {
    pub counts: HashMap<String, usize>,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MajorArcanaPatterns {
    pub count: usize,
    pub positions: Vec<String>,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReversedPatterns {
    pub count: usize,
    pub positions: Vec<String>,
    pub interpretation: String,
}

/// The deterministic structural observations made over a dealt spread,
/// independent of any model call (spec §3 SpreadPatternAnalysis, §4.7
/// PatternAnalyzer).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PatternAnalysis {
    pub position_relationships: PositionRelationships,
    pub number_patterns: NumberPatterns,
    pub suit_distribution: SuitDistribution,
    pub major_arcana_patterns: MajorArcanaPatterns,
    pub reversed_patterns: ReversedPatterns,
    pub special_combinations: Vec<String>,
}

const CELTIC_CROSS_NARRATION: &str = "the cover names the heart of the matter, crossed by the \
    immediate challenge; beneath lies the foundation, behind it what is receding; crowning it \
    is the best outcome or conscious goal, and before it what is coming soon; the self position \
    shows the querent's own attitude set against the environment's external influences, while \
    hopes and fears sit just ahead of the final outcome";

/// Pure structural analysis over a dealt spread: no model calls, no I/O
/// (spec §4.7). A spread with no notable pattern for a given rule simply
/// contributes an empty/neutral value for that field.
pub struct PatternAnalyzer;

impl PatternAnalyzer {
    pub fn analyze(cards: &[DealtCard]) -> PatternAnalysis {
        PatternAnalysis {
            position_relationships: PositionRelationships {
                time_flow: Self::time_flow(cards),
                causal_relationships: Self::causal_relationships(cards),
                support_conflict: Self::support_conflict(cards),
            },
            number_patterns: Self::number_patterns(cards),
            suit_distribution: Self::suit_distribution(cards),
            major_arcana_patterns: Self::major_arcana_patterns(cards),
            reversed_patterns: Self::reversed_patterns(cards),
            special_combinations: Self::special_combinations(cards),
        }
    }

    /// Three-card spreads read as "Past → Present → Future: A → B → C".
    /// Celtic Cross gets a fixed ten-position narration (spec §4.7).
    fn time_flow(cards: &[DealtCard]) -> String {
        if cards.len() == 3 {
            let names: Vec<&str> = cards.iter().map(|c| c.position.as_str()).collect();
            if names == ["past", "present", "future"] {
                return format!(
                    "Past → Present → Future: {} → {} → {}",
                    cards[0].card.name_en, cards[1].card.name_en, cards[2].card.name_en
                );
            }
        }
        if cards.len() == 10 {
            return CELTIC_CROSS_NARRATION.to_string();
        }
        String::new()
    }

    /// `"{posN} → {posN+1}"` for every consecutive pair with non-empty
    /// positions.
    fn causal_relationships(cards: &[DealtCard]) -> Vec<String> {
        cards
            .windows(2)
            .filter(|pair| !pair[0].position.is_empty() && !pair[1].position.is_empty())
            .map(|pair| format!("{} → {}", pair[0].position, pair[1].position))
            .collect()
    }

    /// One sentence derived from the set of suits present: all-same suit is
    /// unified, all-distinct is mixed, otherwise the distribution is spelled
    /// out (spec §4.7).
    fn support_conflict(cards: &[DealtCard]) -> String {
        if cards.is_empty() {
            return String::new();
        }
        let suits: Vec<Suit> = cards.iter().map(|c| c.card.suit).collect();
        let distinct: std::collections::HashSet<Suit> = suits.iter().copied().collect();
        if distinct.len() == 1 {
            return format!(
                "every card shares the {} suit: a unified, single-minded energy",
                suits[0].title_case()
            );
        }
        if distinct.len() == suits.len() {
            return "no suit repeats: a mixed spread drawing from every corner of life".to_string();
        }
        let mut counts: Vec<(Suit, usize)> = distinct
            .into_iter()
            .map(|suit| (suit, suits.iter().filter(|s| **s == suit).count()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.title_case().cmp(b.0.title_case())));
        let parts: Vec<String> = counts
            .iter()
            .map(|(suit, n)| format!("{n} {}", suit.title_case()))
            .collect();
        format!("the spread distributes as {}", parts.join(", "))
    }

    /// Groups minor-arcana card numbers: repeats become `same_numbers`,
    /// adjacent sorted values one apart become `sequences`, values more
    /// than three apart become `jumps` (spec §4.7).
    fn number_patterns(cards: &[DealtCard]) -> NumberPatterns {
        let mut by_number: HashMap<u8, Vec<&DealtCard>> = HashMap::new();
        for card in cards {
            if card.card.arcana == Arcana::Minor {
                by_number.entry(card.card.number).or_default().push(card);
            }
        }

        let mut same_numbers: Vec<String> = by_number
            .iter()
            .filter(|(_, group)| group.len() > 1)
            .map(|(number, group)| {
                format!(
                    "number {number} repeats across {} cards ({})",
                    group.len(),
                    group.iter().map(|c| c.position.as_str()).collect::<Vec<_>>().join(", ")
                )
            })
            .collect();
        same_numbers.sort();

        let mut sorted: Vec<u8> = by_number.keys().copied().collect();
        sorted.sort_unstable();
        let mut sequences = Vec::new();
        let mut jumps = Vec::new();
        for pair in sorted.windows(2) {
            let diff = pair[1].abs_diff(pair[0]);
            if diff == 1 {
                sequences.push(format!("{} follows {} in sequence", pair[1], pair[0]));
            } else if diff > 3 {
                jumps.push(format!("a jump from {} to {}", pair[0], pair[1]));
            }
        }

        NumberPatterns { same_numbers, sequences, jumps }
    }

    fn suit_distribution(cards: &[DealtCard]) -> SuitDistribution {
        let mut counts = HashMap::new();
        for card in cards {
            *counts.entry(card.card.suit.title_case().to_string()).or_insert(0) += 1;
        }

        let majors = *counts.get("Major").unwrap_or(&0);
        let minors_total: usize = counts
            .iter()
            .filter(|(suit, _)| suit.as_str() != "Major")
            .map(|(_, n)| *n)
            .sum();

        let interpretation = if majors > minors_total {
            format!("major arcana dominates with {majors} of {} cards: fate-driven themes outweigh everyday choices", cards.len())
        } else {
            match counts
                .iter()
                .filter(|(suit, _)| suit.as_str() != "Major")
                .max_by_key(|(_, n)| **n)
            {
                Some((suit, n)) => format!("{suit} dominates the minor arcana with {n} cards"),
                None => "no minor-arcana suit dominates".to_string(),
            }
        };

        SuitDistribution { counts, interpretation }
    }

    /// Count and positions of major-arcana cards, with an interpretation
    /// bucketed by count: none, one, a couple, or most of the spread.
    fn major_arcana_patterns(cards: &[DealtCard]) -> MajorArcanaPatterns {
        let majors: Vec<&DealtCard> = cards.iter().filter(|c| c.card.arcana == Arcana::Major).collect();
        let count = majors.len();
        let positions: Vec<String> = majors.iter().map(|c| c.position.clone()).collect();
        let interpretation = match count {
            0 => "no major arcana present: the matter sits in the querent's own hands".to_string(),
            1 => "a single major arcana card marks one pivotal influence".to_string(),
            2 | 3 => "a couple of major arcana cards point to meaningful but not overwhelming forces".to_string(),
            _ => format!("{count} of {} cards are major arcana: significant, fate-driven themes", cards.len()),
        };
        MajorArcanaPatterns { count, positions, interpretation }
    }

    /// Count and positions of reversed cards, with an interpretation
    /// bucketed by fraction reversed: 0, <0.3, <0.7, >=0.7 (spec §4.7,
    /// §8 testable property 11 — boundaries are inclusive of the lower
    /// bucket: exactly 0.3 falls in the `<0.7` bucket, exactly 0.7 falls in
    /// the `>=0.7` bucket).
    fn reversed_patterns(cards: &[DealtCard]) -> ReversedPatterns {
        let reversed: Vec<&DealtCard> = cards.iter().filter(|c| c.is_reversed).collect();
        let count = reversed.len();
        let positions: Vec<String> = reversed.iter().map(|c| c.position.clone()).collect();
        let fraction = if cards.is_empty() { 0.0 } else { count as f32 / cards.len() as f32 };
        let interpretation = if count == 0 {
            "no reversed cards: the energies in this spread move unobstructed".to_string()
        } else if fraction < 0.3 {
            "a handful of reversed cards: isolated pockets of resistance".to_string()
        } else if fraction < 0.7 {
            "a significant minority of reversed cards: real but not dominant internal blockage".to_string()
        } else {
            "reversed cards dominate: pervasive internal or blocked energy".to_string()
        };
        ReversedPatterns { count, positions, interpretation }
    }

    /// Court-card co-occurrence (≥2 court cards), duplicate card names, and a
    /// dominant minor suit (≥2 of the same suit among the minor cards).
    fn special_combinations(cards: &[DealtCard]) -> Vec<String> {
        let mut combos = Vec::new();

        let courts: Vec<&DealtCard> = cards.iter().filter(|c| c.card.is_court()).collect();
        if courts.len() >= 2 {
            let names: Vec<&str> = courts.iter().map(|c| c.card.name_en.as_str()).collect();
            combos.push(format!(
                "{} court cards appear together ({}): other people weigh heavily on this matter",
                courts.len(),
                names.join(", ")
            ));
        }

        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for card in cards {
            *name_counts.entry(card.card.name_en.as_str()).or_insert(0) += 1;
        }
        let mut duplicates: Vec<&str> = name_counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(name, _)| name)
            .collect();
        duplicates.sort_unstable();
        for name in duplicates {
            combos.push(format!("{name} appears more than once: its theme repeats for emphasis"));
        }

        let minors: Vec<&DealtCard> = cards.iter().filter(|c| c.card.arcana == Arcana::Minor).collect();
        let mut suit_counts: HashMap<Suit, usize> = HashMap::new();
        for card in &minors {
            *suit_counts.entry(card.card.suit).or_insert(0) += 1;
        }
        if let Some((suit, n)) = suit_counts.into_iter().find(|(_, n)| *n >= 2) {
            combos.push(format!(
                "{n} cards from the minor suit of {} cluster together: that suit's element colors the whole reading",
                suit.title_case()
            ));
        }

        combos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_cards::Card;

    fn card(name: &str, suit: Suit, arcana: Arcana, number: u8) -> Card {
        Card {
            id: name.to_string(),
            source: "pkt".into(),
            name_en: name.to_string(),
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

    fn dealt(
        name: &str,
        suit: Suit,
        arcana: Arcana,
        number: u8,
        position: &str,
        order: usize,
        reversed: bool,
    ) -> DealtCard {
        DealtCard {
            card: card(name, suit, arcana, number),
            position: position.to_string(),
            position_order: order,
            position_description: None,
            is_reversed: reversed,
        }
    }

    #[test]
    fn three_card_spread_reports_time_flow_with_card_names() {
        let cards = vec![
            dealt("The Tower", Suit::Major, Arcana::Major, 16, "past", 1, true),
            dealt("The Star", Suit::Major, Arcana::Major, 17, "present", 2, false),
            dealt("The Sun", Suit::Major, Arcana::Major, 19, "future", 3, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(
            analysis.position_relationships.time_flow,
            "Past → Present → Future: The Tower → The Star → The Sun"
        );
        assert_eq!(analysis.position_relationships.causal_relationships.len(), 2);
    }

    #[test]
    fn repeated_minor_numbers_are_flagged_as_same_numbers() {
        let cards = vec![
            dealt("Five of Cups", Suit::Cups, Arcana::Minor, 5, "a", 1, false),
            dealt("Five of Swords", Suit::Swords, Arcana::Minor, 5, "b", 2, false),
            dealt("Five of Wands", Suit::Wands, Arcana::Minor, 5, "c", 3, true),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(analysis.number_patterns.same_numbers.len(), 1);
        assert!(analysis.number_patterns.same_numbers[0].contains("number 5"));
    }

    #[test]
    fn adjacent_numbers_one_apart_are_a_sequence() {
        let cards = vec![
            dealt("Four of Cups", Suit::Cups, Arcana::Minor, 4, "a", 1, false),
            dealt("Five of Swords", Suit::Swords, Arcana::Minor, 5, "b", 2, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(analysis.number_patterns.sequences.len(), 1);
        assert!(analysis.number_patterns.jumps.is_empty());
    }

    #[test]
    fn numbers_more_than_three_apart_are_a_jump() {
        let cards = vec![
            dealt("Two of Cups", Suit::Cups, Arcana::Minor, 2, "a", 1, false),
            dealt("Nine of Swords", Suit::Swords, Arcana::Minor, 9, "b", 2, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(analysis.number_patterns.jumps.len(), 1);
    }

    #[test]
    fn court_card_combination_is_detected() {
        let cards = vec![
            dealt("King of Wands", Suit::Wands, Arcana::Minor, 14, "a", 1, false),
            dealt("Queen of Cups", Suit::Cups, Arcana::Minor, 13, "b", 2, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(analysis.special_combinations.len(), 1);
        assert!(analysis.special_combinations[0].contains("court cards"));
    }

    #[test]
    fn duplicate_card_name_is_detected() {
        let cards = vec![
            dealt("The Fool", Suit::Major, Arcana::Major, 0, "a", 1, false),
            dealt("The Fool", Suit::Major, Arcana::Major, 0, "b", 2, true),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert!(analysis.special_combinations.iter().any(|c| c.contains("appears more than once")));
    }

    #[test]
    fn all_upright_is_flagged_with_zero_fraction() {
        let cards = vec![
            dealt("The Fool", Suit::Major, Arcana::Major, 0, "a", 1, false),
            dealt("The Magician", Suit::Major, Arcana::Major, 1, "b", 2, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(analysis.reversed_patterns.count, 0);
        assert!(analysis.reversed_patterns.interpretation.contains("unobstructed"));
    }

    #[test]
    fn reversed_fraction_buckets_match_boundaries() {
        let make = |reversed_count: usize, total: usize| -> Vec<DealtCard> {
            (0..total)
                .map(|i| dealt("Card", Suit::Cups, Arcana::Minor, 2, "p", i + 1, i < reversed_count))
                .collect()
        };
        // exactly 0.3 -> the <0.7 bucket (not the <0.3 bucket)
        let at_30 = PatternAnalyzer::analyze(&make(3, 10));
        assert!(at_30.reversed_patterns.interpretation.contains("significant minority"));
        // exactly 0.7 -> the >=0.7 bucket
        let at_70 = PatternAnalyzer::analyze(&make(7, 10));
        assert!(at_70.reversed_patterns.interpretation.contains("dominate"));
        // below 0.3
        let below_30 = PatternAnalyzer::analyze(&make(2, 10));
        assert!(below_30.reversed_patterns.interpretation.contains("handful"));
    }

    #[test]
    fn suit_distribution_counts_every_card_and_names_dominant_suit() {
        let cards = vec![
            dealt("Ace of Cups", Suit::Cups, Arcana::Minor, 1, "a", 1, false),
            dealt("Two of Cups", Suit::Cups, Arcana::Minor, 2, "b", 2, false),
            dealt("The Fool", Suit::Major, Arcana::Major, 0, "c", 3, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert_eq!(analysis.suit_distribution.counts.get("Cups"), Some(&2));
        assert_eq!(analysis.suit_distribution.counts.get("Major"), Some(&1));
        assert!(analysis.suit_distribution.interpretation.contains("Cups"));
    }

    #[test]
    fn dominant_minor_suit_combination_is_detected() {
        let cards = vec![
            dealt("Two of Swords", Suit::Swords, Arcana::Minor, 2, "a", 1, false),
            dealt("Three of Swords", Suit::Swords, Arcana::Minor, 3, "b", 2, false),
        ];
        let analysis = PatternAnalyzer::analyze(&cards);
        assert!(analysis
            .special_combinations
            .iter()
            .any(|c| c.contains("Swords") && c.contains("cluster")));
    }
}
