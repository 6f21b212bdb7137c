//! ChatServer
//!
//! Owns the registry and dispatcher for one relay instance and serves the
//! router on a listener. Several servers can run in the same process
//! without sharing any state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::registry::Registry;
use crate::routes::build_router;

/// The chat relay server
#[derive(Debug, Clone)]
pub struct ChatServer {
    dispatcher: Dispatcher,
}

impl ChatServer {
    /// Create a server with an empty registry
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(Registry::new())),
        }
    }

    /// Set the per-target broadcast write timeout
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_write_timeout(write_timeout);
        self
    }

    /// The registry of live connections
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.dispatcher.registry())
    }

    /// Serve until the listener fails
    ///
    /// Failed accepts are logged by `axum::serve` and never stop the loop.
    pub async fn run(self, listener: TcpListener) -> std::io::Result<()> {
        let local_addr = listener.local_addr()?;
        info!("Chat relay listening on {}", local_addr);

        let router = build_router(self.dispatcher);
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new()
    }
}
