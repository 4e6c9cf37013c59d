use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::Client;

use tarot_reading::AuditSink;
use tarot_reading::ProcessRow;

use crate::schema::READING_PROCESS_DATA;

/// Postgres-backed audit trail (spec §6 `reading_process_data`, §C supplement
/// 3 step-order metadata). Writes are best-effort: a failure is logged and
/// swallowed, never propagated to the pipeline (spec §7 ErrPersistence).
pub struct PgAuditSink {
    client: Arc<Client>,
}

impl PgAuditSink {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn write(&self, row: ProcessRow) {
        const SQL: &str = const_format::concatcp!(
            "INSERT INTO ",
            READING_PROCESS_DATA,
            " (reading_id, step_name, step_order, input_data, output_data, ",
            "prompt_content, model_used, temperature, processing_time_ms, error_message, recorded_at) ",
            "VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) ",
            "ON CONFLICT (reading_id, step_order) DO UPDATE SET ",
            "output_data = EXCLUDED.output_data, ",
            "processing_time_ms = EXCLUDED.processing_time_ms, ",
            "error_message = EXCLUDED.error_message"
        );
        let result = self
            .client
            .execute(
                SQL,
                &[
                    &row.reading_id.inner(),
                    &row.step_name,
                    &(row.step_order as i16),
                    &row.input_data,
                    &row.output_data,
                    &row.prompt_content,
                    &row.model_used,
                    &row.temperature,
                    &(row.processing_time_ms as i64),
                    &row.error_message,
                ],
            )
            .await;
        if let Err(e) = result {
            log::warn!("audit write failed for reading {}: {e}", row.reading_id);
        }
    }
}
