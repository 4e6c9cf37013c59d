use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::NoTls;

use tarot_core::TarotError;

use crate::schema::RagChunksTable;
use crate::schema::ReadingCardsTable;
use crate::schema::ReadingProcessDataTable;
use crate::schema::ReadingsTable;
use crate::schema::Schema;
use crate::schema::TarotCardsTable;

fn persistence_error(detail: impl std::fmt::Display) -> TarotError {
    TarotError::Persistence { detail: detail.to_string() }
}

/// Connects to Postgres, runs migrations, and returns a shared client.
///
/// Unlike the teacher's `connect::db()`, failure here never panics: the
/// caller gets a `TarotError::Persistence` so a deployment can start in a
/// degraded mode (spec §4.2's health check is a thin wrapper over this same
/// connection, not a separate code path).
pub async fn connect(url: &str) -> Result<Arc<Client>, TarotError> {
    log::info!("connecting to database");
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(persistence_error)?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {e}");
        }
    });

    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await
        .map_err(persistence_error)?;

    client.batch_execute(TarotCardsTable::creates()).await.map_err(persistence_error)?;
    client.batch_execute(TarotCardsTable::indices()).await.map_err(persistence_error)?;
    client.batch_execute(RagChunksTable::creates()).await.map_err(persistence_error)?;
    client.batch_execute(RagChunksTable::indices()).await.map_err(persistence_error)?;
    client.batch_execute(ReadingsTable::creates()).await.map_err(persistence_error)?;
    client.batch_execute(ReadingsTable::indices()).await.map_err(persistence_error)?;
    client.batch_execute(ReadingCardsTable::creates()).await.map_err(persistence_error)?;
    client.batch_execute(ReadingCardsTable::indices()).await.map_err(persistence_error)?;
    client.batch_execute(ReadingProcessDataTable::creates()).await.map_err(persistence_error)?;
    client.batch_execute(ReadingProcessDataTable::indices()).await.map_err(persistence_error)?;

    Ok(Arc::new(client))
}

/// Trivial `select 1`-equivalent probe for a readiness endpoint (spec §4.2).
/// A failure here means "degraded", not "crash the process".
pub async fn health_check(client: &Client) -> Result<(), TarotError> {
    client.execute("SELECT 1", &[]).await.map_err(persistence_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_to_an_invalid_url_returns_persistence_error_not_a_panic() {
        let result = connect("postgres://nobody@nonexistent-host-for-tests/db").await;
        assert!(matches!(result, Err(TarotError::Persistence { .. })));
    }
}
