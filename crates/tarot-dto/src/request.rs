use serde::Deserialize;

/// Body of a streamed-reading request (spec §6 External interfaces:
/// `{question, userId?, userSelectedSpread?, userProfile?, preferredSource?,
/// sourcePage?}`).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReadingRequest {
    pub question: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, rename = "spread")]
    pub user_selected_spread: Option<String>,
    #[serde(default, rename = "source")]
    pub preferred_source: Option<String>,
    #[serde(default, rename = "querent")]
    pub user_profile: Option<QuerentProfile>,
    #[serde(default)]
    pub source_page: Option<String>,
}

/// Optional details about the querent, used only for significator
/// resolution; every field is independently optional (spec §4.5).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuerentProfile {
    #[serde(default)]
    pub zodiac_sign: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    /// Already a suit name (`"wands"`, `"cups"`, ...), if the querent stated
    /// their personality type directly rather than through a zodiac sign.
    #[serde(default)]
    pub personality_type: Option<String>,
    /// Which source wins when more than one could pick a significator suit:
    /// `question_first` (default), `personality_first`, or `zodiac_first`.
    #[serde(default)]
    pub priority: Option<String>,
    /// Output language for the final interpretation: `"zh"` or `"en"`
    /// (default, spec §4.11).
    #[serde(default)]
    pub language: Option<String>,
}
