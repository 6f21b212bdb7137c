//! Connection registry
//!
//! The set of live connections keyed by `ConnectionId`. This is the only
//! shared mutable state in the relay; it is passed around as `Arc<Registry>`.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::Connection;
use crate::error::RegistryError;
use crate::message::ServerEvent;
use crate::types::ConnectionId;

/// Attempts at drawing an unused id before giving up
const MAX_ID_ATTEMPTS: usize = 16;

/// A connection's entry in the registry
#[derive(Debug)]
pub struct Registration {
    /// The id the connection is known by
    pub id: ConnectionId,
    /// Cancelled when the connection is unregistered, by anyone
    pub closed: CancellationToken,
}

/// Registry of all live connections
///
/// The lock is only held for map operations, never while delivering.
#[derive(Debug, Default)]
pub struct Registry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly accepted connection's outbound channel
    ///
    /// Returns the fresh id and the token that fires when the entry is removed.
    pub async fn register(
        &self,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<Registration, RegistryError> {
        let mut connections = self.connections.write().await;
        let id = allocate_id(&connections, ConnectionId::new)?;
        let conn = Connection::new(id, sender);
        let closed = conn.closed_token();
        connections.insert(id, conn);
        debug!("Registered {}, total connections: {}", id, connections.len());
        Ok(Registration { id, closed })
    }

    /// Remove a connection and signal its handler to drop the socket
    ///
    /// Returns whether the id was present. Removing an absent id is a no-op.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        match connections.remove(&id) {
            Some(conn) => {
                conn.close();
                debug!("Unregistered {}, total connections: {}", id, connections.len());
                true
            }
            None => false,
        }
    }

    /// Connections registered at the instant of the call
    pub async fn snapshot(&self) -> Vec<Connection> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Check if a connection is registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Check if no connection is registered
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

/// Draw ids from `generate` until one is not in use
fn allocate_id(
    connections: &HashMap<ConnectionId, Connection>,
    mut generate: impl FnMut() -> ConnectionId,
) -> Result<ConnectionId, RegistryError> {
    (0..MAX_ID_ATTEMPTS)
        .map(|_| generate())
        .find(|id| !connections.contains_key(id))
        .ok_or(RegistryError::ResourceExhausted)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn channel() -> mpsc::Sender<ServerEvent> {
        let (tx, _rx) = mpsc::channel(8);
        tx
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let registry = Registry::new();
        assert!(registry.is_empty().await);

        let a = registry.register(channel()).await.unwrap().id;
        let b = registry.register(channel()).await.unwrap().id;

        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);
        assert!(registry.contains(a).await);
        assert!(registry.contains(b).await);

        assert!(registry.unregister(a).await);
        assert!(!registry.contains(a).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = Registry::new();
        let id = registry.register(channel()).await.unwrap().id;

        assert!(registry.unregister(id).await);
        assert!(!registry.unregister(id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregister_fires_close_token() {
        let registry = Registry::new();
        let registration = registry.register(channel()).await.unwrap();
        assert!(!registration.closed.is_cancelled());

        registry.unregister(registration.id).await;
        assert!(registration.closed.is_cancelled());
    }

    #[tokio::test]
    async fn test_unregister_unknown_on_empty_registry() {
        let registry = Registry::new();
        assert!(!registry.unregister(ConnectionId::new()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_membership_after_replay() {
        let registry = Registry::new();
        let mut ids = Vec::new();
        for _ in 0..6 {
            ids.push(registry.register(channel()).await.unwrap().id);
        }

        // Remove some twice and interleave with further registrations
        registry.unregister(ids[1]).await;
        registry.unregister(ids[4]).await;
        let late = registry.register(channel()).await.unwrap().id;
        registry.unregister(ids[1]).await;
        registry.unregister(ConnectionId::new()).await;

        let expected: HashSet<ConnectionId> = [ids[0], ids[2], ids[3], ids[5], late]
            .into_iter()
            .collect();
        let actual: HashSet<ConnectionId> = registry
            .snapshot()
            .await
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let registry = Registry::new();
        let a = registry.register(channel()).await.unwrap().id;

        let snapshot = registry.snapshot().await;
        registry.unregister(a).await;
        registry.register(channel()).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, a);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register() {
        const N: usize = 200;
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.register(channel()).await.unwrap().id })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), N);
        assert_eq!(registry.len().await, N);
    }

    #[test]
    fn test_allocate_id_skips_taken_ids() {
        let taken = ConnectionId::new();
        let fresh = ConnectionId::new();
        let mut connections = HashMap::new();
        connections.insert(taken, Connection::new(taken, channel()));

        let mut candidates = vec![fresh, taken].into_iter().rev();
        let id = allocate_id(&connections, || candidates.next().unwrap()).unwrap();
        assert_eq!(id, fresh);
    }

    #[test]
    fn test_allocate_id_exhausted() {
        let taken = ConnectionId::new();
        let mut connections = HashMap::new();
        connections.insert(taken, Connection::new(taken, channel()));

        let result = allocate_id(&connections, || taken);
        assert_eq!(result, Err(RegistryError::ResourceExhausted));
    }
}
