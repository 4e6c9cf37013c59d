/// Chat-model names for the three LLM call sites a reading makes (spec §6
/// Config surface: "model preset string, with presets resolving to
/// {question-analysis model, imagery model, final-interpretation model}").
/// Mirrors the original's named presets (`gpt4omini_fast`, `gpt5_4omini`,
/// `deepseek_r1_v3`, `deepseek_fast`, `gemini_25pro_15`); unknown presets
/// fall back to `gpt4omini_fast`.
pub struct ModelPreset {
    pub question: &'static str,
    pub imagery: &'static str,
    pub interpretation: &'static str,
}

impl ModelPreset {
    pub fn resolve(name: &str) -> Self {
        match name {
            "gpt5_4omini" => Self { question: "gpt-4o-mini", imagery: "gpt-4o-mini", interpretation: "gpt-5" },
            "deepseek_r1_v3" => {
                Self { question: "deepseek-chat", imagery: "deepseek-chat", interpretation: "deepseek-reasoner" }
            }
            "deepseek_fast" => Self { question: "deepseek-chat", imagery: "deepseek-chat", interpretation: "deepseek-chat" },
            "gemini_25pro_15" => {
                Self { question: "gemini-1.5-flash", imagery: "gemini-1.5-flash", interpretation: "gemini-2.5-pro" }
            }
            _ => Self { question: "gpt-4o-mini", imagery: "gpt-4o-mini", interpretation: "gpt-4o-mini" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preset_falls_back_to_gpt4omini_fast() {
        let preset = ModelPreset::resolve("not_a_real_preset");
        assert_eq!(preset.question, "gpt-4o-mini");
        assert_eq!(preset.interpretation, "gpt-4o-mini");
    }

    #[test]
    fn deepseek_r1_v3_uses_reasoner_for_interpretation_only() {
        let preset = ModelPreset::resolve("deepseek_r1_v3");
        assert_eq!(preset.question, "deepseek-chat");
        assert_eq!(preset.interpretation, "deepseek-reasoner");
    }
}
