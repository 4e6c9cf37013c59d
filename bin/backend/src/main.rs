//! Tarot reading backend binary.
//!
//! Boots logging, an interrupt handler, and the HTTP/SSE server.

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tarot_core::init_logging();
    tarot_core::install_interrupt_handler();
    tarot_server::Server::run().await
}
