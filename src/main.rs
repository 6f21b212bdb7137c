//! Broadcast WebSocket Chat Relay - Entry Point
//!
//! Loads configuration, binds the TCP listener and runs the relay.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Port comes from PORT, defaulting to 3000
    let config = Config::from_env()?;

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Server listening on port {}", config.port);

    ChatServer::new().run(listener).await?;

    Ok(())
}
