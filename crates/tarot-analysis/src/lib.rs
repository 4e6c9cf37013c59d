//! Deterministic spread-pattern analysis and LLM-backed question
//! classification (spec §4.7 PatternAnalyzer, §4.8 QuestionAnalyzer).

mod pattern;
mod question;

pub use pattern::MajorArcanaPatterns;
pub use pattern::NumberPatterns;
pub use pattern::PatternAnalysis;
pub use pattern::PatternAnalyzer;
pub use pattern::PositionRelationships;
pub use pattern::ReversedPatterns;
pub use pattern::SuitDistribution;
pub use question::QuestionAnalysis;
pub use question::QuestionAnalyzer;
pub use question::QuestionComplexity;
pub use question::QuestionDomain;
pub use question::QuestionType;
pub use question::RecommendedSpread;
