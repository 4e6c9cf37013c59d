use tarot_core::TarotError;
use tarot_core::QUESTION_ANALYSIS_TEMPERATURE;
use tarot_rag::ChatRequest;
use tarot_rag::ModelClient;

const STAGE: &str = "question_analysis";

/// The domain a question falls into; also drives significator suit
/// resolution when no zodiac sign wins priority (spec §4.5, §3 QuestionAnalysis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionDomain {
    Love,
    Career,
    Health,
    Finance,
    PersonalGrowth,
    General,
}

impl QuestionDomain {
    fn parse_loose(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "love" | "relationship" | "relationships" => QuestionDomain::Love,
            "career" | "work" => QuestionDomain::Career,
            "health" => QuestionDomain::Health,
            "finance" | "money" => QuestionDomain::Finance,
            "personal_growth" | "growth" | "spiritual" | "purpose" => QuestionDomain::PersonalGrowth,
            _ => QuestionDomain::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionDomain::Love => "love",
            QuestionDomain::Career => "career",
            QuestionDomain::Health => "health",
            QuestionDomain::Finance => "finance",
            QuestionDomain::PersonalGrowth => "personal_growth",
            QuestionDomain::General => "general",
        }
    }
}

/// How involved a question is; only assigned when the spread is auto-selected
/// (spec §3: "null when spread was user-chosen").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionComplexity {
    Simple,
    Moderate,
    Complex,
}

impl QuestionComplexity {
    fn parse_loose(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "simple" => QuestionComplexity::Simple,
            "complex" => QuestionComplexity::Complex,
            _ => QuestionComplexity::Moderate,
        }
    }
}

/// The shape of a question, independent of its subject domain (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SpecificEvent,
    Relationship,
    Choice,
    General,
}

impl QuestionType {
    fn parse_loose(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "specific_event" => QuestionType::SpecificEvent,
            "relationship" => QuestionType::Relationship,
            "choice" => QuestionType::Choice,
            _ => QuestionType::General,
        }
    }
}

/// The spread the analyzer recommends, before the user's own choice (if any)
/// overrides it (spec §3, §4.6 — `work_cycle` and `other` have no position
/// list and are recommendation-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedSpread {
    ThreeCard,
    CelticCross,
    WorkCycle,
    Other,
}

impl RecommendedSpread {
    fn parse_loose(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "celtic_cross" => RecommendedSpread::CelticCross,
            "work_cycle" => RecommendedSpread::WorkCycle,
            "three_card" => RecommendedSpread::ThreeCard,
            _ => RecommendedSpread::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedSpread::ThreeCard => "three_card",
            RecommendedSpread::CelticCross => "celtic_cross",
            RecommendedSpread::WorkCycle => "work_cycle",
            RecommendedSpread::Other => "other",
        }
    }
}

/// The structured read of a querent's question (spec §3 QuestionAnalysis).
#[derive(Debug, Clone, serde::Serialize)]
pub struct QuestionAnalysis {
    pub domain: QuestionDomain,
    /// `None` when the caller supplied an explicit (non-`"auto"`) spread,
    /// per spec §4.8's simplified prompt path.
    pub complexity: Option<QuestionComplexity>,
    pub question_type: QuestionType,
    /// `None` only in the (unreachable in practice) case where the model's
    /// JSON omitted the field entirely and the simplified prompt was used.
    pub recommended_spread: Option<RecommendedSpread>,
    pub reasoning: String,
    pub summary: String,
    /// Whether `Self::decide_spread` ended up using `recommended_spread`
    /// rather than a user-supplied selection.
    pub auto_selected_spread: bool,
}

impl QuestionAnalysis {
    /// Final spread decision (spec §4.8): the user's pick wins unless it is
    /// absent or `"auto"`, in which case the recommendation wins, falling
    /// back to `three_card` if even that is absent.
    pub fn decide_spread(user_selected: Option<&str>) -> impl Fn(&Self) -> String + '_ {
        move |analysis: &Self| match user_selected {
            Some(spread) if spread != "auto" => spread.to_string(),
            _ => analysis
                .recommended_spread
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "three_card".to_string()),
        }
    }
}

#[derive(serde::Deserialize, Default)]
struct RawAnalysis {
    #[serde(default)]
    question_domain: Option<String>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default)]
    question_type: Option<String>,
    #[serde(default)]
    recommended_spread: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    question_summary: Option<String>,
}

/// Classifies a querent's question with a single LLM call. Every field in
/// the response is individually optional and defaulted on the client side —
/// a model returning a partial object still produces a usable analysis
/// rather than a hard failure (spec §4.8).
pub struct QuestionAnalyzer;

impl QuestionAnalyzer {
    /// `user_selected_spread` is the caller's own spread choice, if any.
    /// `None` or `Some("auto")` triggers the full template (which asks the
    /// model for `complexity` and `recommended_spread`); anything else uses
    /// the simplified template.
    pub async fn analyze(
        client: &dyn ModelClient,
        question: &str,
        user_selected_spread: Option<&str>,
    ) -> Result<QuestionAnalysis, TarotError> {
        let auto = matches!(user_selected_spread, None | Some("auto"));
        let system = if auto { full_prompt() } else { simplified_prompt() };
        let request = ChatRequest {
            system,
            user: question.to_string(),
            temperature: QUESTION_ANALYSIS_TEMPERATURE,
            json_mode: true,
        };

        let raw = client.chat(STAGE, request).await?;
        match parse(&raw, auto) {
            Some(analysis) => Ok(analysis),
            None => {
                log::warn!(
                    "{STAGE}: first response was unparseable, retrying without response-format hint"
                );
                let retry_request = ChatRequest {
                    system: if auto { full_prompt() } else { simplified_prompt() },
                    user: question.to_string(),
                    temperature: QUESTION_ANALYSIS_TEMPERATURE,
                    json_mode: false,
                };
                let raw = client.chat(STAGE, retry_request).await?;
                parse(&raw, auto).ok_or_else(|| TarotError::LlmParse {
                    stage: STAGE.to_string(),
                    detail: format!(
                        "could not parse question analysis from: {}",
                        truncate(&raw, 200)
                    ),
                })
            }
        }
    }
}

/// Strips a fenced-code wrapper (```json ... ```) before attempting to parse,
/// since a provider asked for JSON without the response-format mode will
/// sometimes still wrap its answer in one (spec §4.3).
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.trim_end_matches("```").trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.trim_end_matches("```").trim()
    } else {
        trimmed
    }
}

fn parse(raw: &str, auto: bool) -> Option<QuestionAnalysis> {
    let cleaned = strip_fence(raw);
    let parsed: RawAnalysis = serde_json::from_str(cleaned).ok()?;

    let domain = parsed
        .question_domain
        .as_deref()
        .map(QuestionDomain::parse_loose)
        .unwrap_or(QuestionDomain::General);
    if parsed.question_domain.is_some() && domain == QuestionDomain::General {
        log::warn!("{STAGE}: unknown question_domain, defaulting to general");
    }

    let question_type = parsed
        .question_type
        .as_deref()
        .map(QuestionType::parse_loose)
        .unwrap_or(QuestionType::General);

    let recommended_spread = if auto {
        Some(
            parsed
                .recommended_spread
                .as_deref()
                .map(RecommendedSpread::parse_loose)
                .unwrap_or(RecommendedSpread::ThreeCard),
        )
    } else {
        None
    };

    let complexity = if auto {
        Some(
            parsed
                .complexity
                .as_deref()
                .map(QuestionComplexity::parse_loose)
                .unwrap_or(QuestionComplexity::Moderate),
        )
    } else {
        None
    };

    Some(QuestionAnalysis {
        domain,
        complexity,
        question_type,
        recommended_spread,
        reasoning: parsed.reasoning.unwrap_or_default(),
        summary: parsed.question_summary.unwrap_or_default(),
        auto_selected_spread: auto,
    })
}

fn full_prompt() -> String {
    "You are a tarot reading assistant. Analyze the querent's question and \
     respond with a JSON object with the fields: question_domain (one of \
     love, career, health, finance, personal_growth, general), complexity \
     (one of simple, moderate, complex), question_type (one of \
     specific_event, relationship, choice, general), recommended_spread \
     (one of three_card, celtic_cross, work_cycle, other), reasoning (why \
     you classified it this way), and question_summary (a one-sentence \
     restatement of what the querent is really asking). Consider tone, \
     urgency, and implicit context, not just the literal words."
        .to_string()
}

fn simplified_prompt() -> String {
    "The querent has already chosen their spread. Classify this tarot \
     question. Reply with JSON only: {\"question_domain\": \"love|career|\
     health|finance|personal_growth|general\", \"question_type\": \
     \"specific_event|relationship|choice|general\", \"reasoning\": \"...\", \
     \"question_summary\": \"...\"}"
        .to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedClient {
        replies: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn chat(&self, _stage: &'static str, _request: ChatRequest) -> Result<String, TarotError> {
            let mut replies = self.replies.lock().unwrap();
            Ok(replies.remove(0).to_string())
        }

        async fn chat_stream(
            &self,
            _stage: &'static str,
            _request: ChatRequest,
        ) -> Result<tarot_rag::ChatStream, TarotError> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn embed(&self, _stage: &'static str, _text: &str) -> Result<Vec<f32>, TarotError> {
            Ok(vec![0.0])
        }

        fn embedding_dimensions(&self) -> tarot_core::Dimensions {
            1
        }
    }

    #[tokio::test]
    async fn well_formed_full_response_is_parsed_directly() {
        let client = ScriptedClient {
            replies: std::sync::Mutex::new(vec![
                r#"{"question_domain":"love","complexity":"complex","question_type":"relationship","recommended_spread":"celtic_cross","reasoning":"long-term stakes","question_summary":"about a relationship"}"#,
            ]),
        };
        let analysis = QuestionAnalyzer::analyze(&client, "Will my relationship last?", None)
            .await
            .unwrap();
        assert_eq!(analysis.domain, QuestionDomain::Love);
        assert_eq!(analysis.recommended_spread, Some(RecommendedSpread::CelticCross));
        assert_eq!(analysis.complexity, Some(QuestionComplexity::Complex));
        assert!(analysis.auto_selected_spread);
    }

    #[tokio::test]
    async fn user_chosen_spread_skips_complexity_and_recommendation() {
        let client = ScriptedClient {
            replies: std::sync::Mutex::new(vec![
                r#"{"question_domain":"career","question_type":"choice","reasoning":"job change","question_summary":"should I switch jobs"}"#,
            ]),
        };
        let analysis = QuestionAnalyzer::analyze(&client, "Should I change jobs?", Some("three_card"))
            .await
            .unwrap();
        assert_eq!(analysis.domain, QuestionDomain::Career);
        assert!(analysis.complexity.is_none());
        assert!(analysis.recommended_spread.is_none());
        assert!(!analysis.auto_selected_spread);
    }

    #[tokio::test]
    async fn partial_response_is_defaulted() {
        let client = ScriptedClient {
            replies: std::sync::Mutex::new(vec![r#"{"question_domain":"career"}"#]),
        };
        let analysis = QuestionAnalyzer::analyze(&client, "Should I change jobs?", None)
            .await
            .unwrap();
        assert_eq!(analysis.domain, QuestionDomain::Career);
        assert_eq!(analysis.recommended_spread, Some(RecommendedSpread::ThreeCard));
        assert_eq!(analysis.complexity, Some(QuestionComplexity::Moderate));
    }

    #[tokio::test]
    async fn unparseable_first_response_retries_without_json_mode() {
        let client = ScriptedClient {
            replies: std::sync::Mutex::new(vec![
                "sorry, I cannot help with that",
                r#"{"question_domain":"general","complexity":"simple","question_type":"general","recommended_spread":"three_card","reasoning":"vague","question_summary":"a general question"}"#,
            ]),
        };
        let analysis = QuestionAnalyzer::analyze(&client, "???", None).await.unwrap();
        assert_eq!(analysis.domain, QuestionDomain::General);
        assert_eq!(analysis.complexity, Some(QuestionComplexity::Simple));
    }

    #[tokio::test]
    async fn unknown_domain_string_defaults_to_general() {
        let client = ScriptedClient {
            replies: std::sync::Mutex::new(vec![r#"{"question_domain":"astrology"}"#]),
        };
        let analysis = QuestionAnalyzer::analyze(&client, "What does the cosmos say?", Some("celtic_cross"))
            .await
            .unwrap();
        assert_eq!(analysis.domain, QuestionDomain::General);
    }

    #[test]
    fn decide_spread_prefers_user_choice_over_recommendation() {
        let analysis = QuestionAnalysis {
            domain: QuestionDomain::General,
            complexity: Some(QuestionComplexity::Moderate),
            question_type: QuestionType::General,
            recommended_spread: Some(RecommendedSpread::CelticCross),
            reasoning: String::new(),
            summary: String::new(),
            auto_selected_spread: true,
        };
        let decide = QuestionAnalysis::decide_spread(Some("three_card"));
        assert_eq!(decide(&analysis), "three_card");
        let decide_auto = QuestionAnalysis::decide_spread(Some("auto"));
        assert_eq!(decide_auto(&analysis), "celtic_cross");
        let decide_none = QuestionAnalysis::decide_spread(None);
        assert_eq!(decide_none(&analysis), "celtic_cross");
    }
}
