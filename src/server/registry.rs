//! Process-wide registry of live connections
//!
//! Maps connection ids to their outbound queues so a server event can be
//! broadcast to every live connection. Owned by the accept loop and handed
//! to each connection; entries are removed on teardown.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::server::protocol::ServerMessage;

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, mpsc::Sender<ServerMessage>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, events: mpsc::Sender<ServerMessage>) {
        self.connections.write().insert(id, events);
    }

    pub fn remove(&self, id: &Uuid) {
        self.connections.write().remove(id);
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Enqueue a process-wide notice on every live connection.
    ///
    /// Connections that are tearing down are skipped; the lock is released
    /// before any send awaits.
    pub async fn broadcast(&self, msg: ServerMessage) {
        let targets: Vec<mpsc::Sender<ServerMessage>> =
            self.connections.read().values().cloned().collect();

        for events in targets {
            let _ = events.send(msg.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_all_connections() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);

        let id1 = Uuid::new_v4();
        let id2 = Uuid::new_v4();
        registry.insert(id1, tx1);
        registry.insert(id2, tx2);
        assert_eq!(registry.len(), 2);

        registry.broadcast(ServerMessage::Ping).await;
        assert_eq!(rx1.recv().await, Some(ServerMessage::Ping));
        assert_eq!(rx2.recv().await, Some(ServerMessage::Ping));

        registry.remove(&id1);
        registry.broadcast(ServerMessage::Pong).await;
        assert_eq!(rx2.recv().await, Some(ServerMessage::Pong));
        assert!(rx1.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }
}
