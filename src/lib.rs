//! Broadcast WebSocket Chat Relay Library
//!
//! A minimal real-time chat relay built with axum WebSockets: every chat
//! message a client sends is broadcast unchanged to all connected clients,
//! the sender included.
//!
//! # Features
//! - WebSocket connection handling
//! - Broadcast of opaque JSON chat payloads
//! - Per-target write timeout; failed clients are dropped
//! - Bundled chat page served on the same port
//! - Disconnection handling
//!
//! # Architecture
//! - `Registry` holds the live connections behind an async `RwLock`
//! - `Dispatcher` snapshots the registry and fans each message out
//! - Each connection runs a `handler` with separate read and write tasks
//! - Removing a connection from the registry closes its socket
//! - The lock is never held while delivering
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().unwrap();
//!     let listener = TcpListener::bind(config.bind_addr()).await.unwrap();
//!     ChatServer::new().run(listener).await.unwrap();
//! }
//! ```

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod routes;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use connection::Connection;
pub use dispatcher::{BroadcastReport, Dispatcher};
pub use error::{AppError, ConfigError, DeliveryError, RegistryError};
pub use handler::handle_socket;
pub use message::{ChatMessage, ClientEvent, ServerEvent};
pub use registry::{Registration, Registry};
pub use routes::build_router;
pub use server::ChatServer;
pub use types::ConnectionId;
