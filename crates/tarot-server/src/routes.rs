use actix_web::web;
use actix_web::HttpResponse;
use actix_web::Responder;
use futures::Stream;
use tarot_dto::CreateReadingRequest;
use tarot_dto::Event;
use tarot_reading::ReadingOrchestrator;

use crate::state::AppState;

/// Streams a reading as Server-Sent Events (spec §6 External interfaces).
pub async fn stream_reading(state: web::Data<AppState>, body: web::Json<CreateReadingRequest>) -> impl Responder {
    let (rx, _handle) = ReadingOrchestrator::stream_reading(state.ctx.clone(), body.into_inner());
    HttpResponse::Ok().content_type("text/event-stream").streaming(event_stream(rx))
}

fn event_stream(rx: tokio::sync::mpsc::UnboundedReceiver<Event>) -> impl Stream<Item = Result<actix_web::web::Bytes, actix_web::Error>> {
    futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        let frame = format!("data: {payload}\n\n");
        Some((Ok(actix_web::web::Bytes::from(frame)), rx))
    })
}

/// Non-streaming variant: waits for the whole pipeline and returns the
/// finished reading as one JSON body.
pub async fn create_reading(state: web::Data<AppState>, body: web::Json<CreateReadingRequest>) -> impl Responder {
    let response = ReadingOrchestrator::create_reading(state.ctx.clone(), body.into_inner()).await;
    HttpResponse::Ok().json(response)
}

pub async fn health(state: web::Data<AppState>) -> impl Responder {
    match state.health().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })),
        Err(e) => HttpResponse::Ok()
            .status(actix_web::http::StatusCode::OK)
            .json(serde_json::json!({ "status": "degraded", "detail": e.to_string() })),
    }
}
