//! Thin actix-web surface exposing the reading pipeline over HTTP/SSE
//! (spec §6 External interfaces). Kept intentionally small: HTTP routing,
//! auth, and a generic config framework are named non-goals — this crate
//! exists only so the pipeline in `tarot-reading` is exercisable end-to-end.

mod config;
mod preset;
mod routes;
mod state;

pub use config::ReadingConfig;
pub use preset::ModelPreset;
pub use state::AppState;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;

pub struct Server;

impl Server {
    pub async fn run() -> std::io::Result<()> {
        let config = ReadingConfig::from_env();
        let bind_addr = config.bind_addr.clone();
        let prefix = config.api_v1_prefix.clone();
        let origins = config.cors_origins.clone();

        log::info!("starting tarot reading server on {bind_addr}");
        let state = web::Data::new(AppState::build(&config).await);

        HttpServer::new(move || {
            let mut cors = Cors::default().allow_any_method().allow_any_header();
            for origin in &origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(cors)
                .app_data(state.clone())
                .service(
                    web::scope(&prefix)
                        .route("/readings/stream", web::post().to(routes::stream_reading))
                        .route("/readings", web::post().to(routes::create_reading))
                        .route("/healthz", web::get().to(routes::health)),
                )
        })
        .bind(bind_addr)?
        .run()
        .await
    }
}
