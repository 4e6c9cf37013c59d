use async_trait::async_trait;
use tarot_core::ID;

use crate::reading::Reading;

/// One audit row per pipeline stage (spec §3 ProcessRow, §C supplement 3 for
/// `step_order`). Mirrors the original's numbering: question-analysis is
/// stage 2 (significator resolution is stage 3 but unaudited — it has no
/// model/prompt to record), card-selection 4, pattern-analysis 5,
/// rag-retrieval 6, imagery 7, final-interpretation 8.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessRow {
    pub reading_id: ID<Reading>,
    pub step_name: &'static str,
    pub step_order: u8,
    pub input_data: serde_json::Value,
    pub output_data: serde_json::Value,
    pub prompt_content: Option<String>,
    pub model_used: Option<String>,
    pub temperature: Option<f32>,
    pub processing_time_ms: u64,
    pub error_message: Option<String>,
}

impl ProcessRow {
    pub fn new(
        reading_id: ID<Reading>,
        step_name: &'static str,
        step_order: u8,
        input_data: serde_json::Value,
        output_data: serde_json::Value,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            reading_id,
            step_name,
            step_order,
            input_data,
            output_data,
            prompt_content: None,
            model_used: None,
            temperature: None,
            processing_time_ms,
            error_message: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_content = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>, temperature: f32) -> Self {
        self.model_used = Some(model.into());
        self.temperature = Some(temperature);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

pub const STEP_QUESTION_ANALYSIS: u8 = 2;
pub const STEP_CARD_SELECTION: u8 = 4;
pub const STEP_PATTERN_ANALYSIS: u8 = 5;
pub const STEP_RAG_RETRIEVAL: u8 = 6;
pub const STEP_IMAGERY: u8 = 7;
pub const STEP_INTERPRETATION: u8 = 8;

/// Writes per-step audit rows. Writes never block the pipeline: a failure is
/// logged and swallowed (spec §7 ErrPersistence — "audit-row writes are
/// swallowed with a warning"). Concrete storage lives in `tarot-database`.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, row: ProcessRow);
}

/// An `AuditSink` that only logs, used by tests and as a default when no
/// database is configured.
#[derive(Debug, Default)]
pub struct LoggingAuditSink;

#[async_trait]
impl AuditSink for LoggingAuditSink {
    async fn write(&self, row: ProcessRow) {
        log::debug!(
            "audit: reading={} step={} order={} took={}ms",
            row.reading_id,
            row.step_name,
            row.step_order,
            row.processing_time_ms
        );
    }
}
