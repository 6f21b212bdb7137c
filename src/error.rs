//! Error types for the chat relay
//!
//! Defines application-level errors, registry and delivery errors, and
//! configuration errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Any of these ends the affected connection (or startup, for `Config`)
/// but never the server as a whole.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] axum::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection could not be registered
    #[error("Registration failed: {0}")]
    Registry(#[from] RegistryError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Connection registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No unused connection id could be allocated
    #[error("Connection id space exhausted")]
    ResourceExhausted,
}

/// Per-target delivery errors
///
/// Occurs when a broadcast cannot be handed to one connection's outbound queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    Closed,

    /// The outbound queue stayed full for the whole write timeout
    #[error("Write timed out")]
    TimedOut,
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// PORT is not a valid TCP port number
    #[error("Invalid port: {0:?}")]
    InvalidPort(String),
}
