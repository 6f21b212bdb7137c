//! Broadcast dispatcher
//!
//! Fans a chat message out to every registered connection, the sender
//! included. Failed targets are dropped from the registry; the rest still
//! get the message.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::message::{ChatMessage, ServerEvent};
use crate::registry::Registry;
use crate::types::ConnectionId;

/// Default bound on a single target's delivery
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one broadcast
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of targets the message was queued for
    pub delivered: usize,
    /// Targets that failed and were unregistered
    pub failed: Vec<ConnectionId>,
}

/// Broadcast dispatcher
///
/// Cheap to clone; every connection handler holds one.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    write_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over the given registry
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Set the per-target write timeout
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// The registry this dispatcher broadcasts to
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Broadcast a chat message received from `origin`
    pub async fn on_message(&self, origin: ConnectionId, payload: ChatMessage) -> BroadcastReport {
        info!("Message received from {}: {}", origin, payload);

        let targets = self.registry.snapshot().await;
        let timeout = self.write_timeout;

        let deliveries = targets.iter().map(|conn| {
            let event = ServerEvent::ChatMessage(payload.clone());
            async move { (conn.id, conn.send(event, timeout).await) }
        });

        let mut report = BroadcastReport::default();
        for (id, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Delivery to {} failed: {}", id, e);
                    self.registry.unregister(id).await;
                    report.failed.push(id);
                }
            }
        }

        debug!(
            "Broadcast from {}: delivered {}, failed {}",
            origin,
            report.delivered,
            report.failed.len()
        );
        report
    }
}
