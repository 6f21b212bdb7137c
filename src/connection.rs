//! Connection struct definition
//!
//! Represents one live client session, its outbound channel and the signal
//! that tears its socket down.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio_util::sync::CancellationToken;

use crate::error::DeliveryError;
use crate::message::ServerEvent;
use crate::types::ConnectionId;

/// Connected client
///
/// The sender is the only way to reach this client: whatever is queued on
/// it gets written to the WebSocket by the connection's writer task.
/// Cancelling `closed` makes the connection's handler drop the socket.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Server → Client message channel
    sender: mpsc::Sender<ServerEvent>,
    /// Fired once the connection leaves the registry
    closed: CancellationToken,
}

impl Connection {
    /// Create a new connection with the given ID and sender channel
    pub fn new(id: ConnectionId, sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id,
            sender,
            closed: CancellationToken::new(),
        }
    }

    /// Queue an event for this client, waiting at most `timeout` for room
    ///
    /// Returns an error if the channel is closed (client disconnected) or
    /// stayed full for the whole timeout.
    pub async fn send(&self, event: ServerEvent, timeout: Duration) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.sender
            .send_timeout(event, timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Closed(_) => DeliveryError::Closed,
                SendTimeoutError::Timeout(_) => DeliveryError::TimedOut,
            })
    }

    /// Check whether the connection can no longer take events
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.sender.is_closed()
    }

    /// Signal the handler to drop the socket
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Token the handler waits on
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}
