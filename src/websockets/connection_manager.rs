use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Tracks open WebSocket connections and which room each one watches
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(
        &self,
        room_id: &str,
        connection_id: String,
        sender: mpsc::UnboundedSender<String>,
    );

    async fn remove_connection(&self, connection_id: &str);

    async fn send_to_connection(&self, connection_id: &str, message: &str);

    /// Sends to every connection watching `room_id`
    async fn send_to_room(&self, room_id: &str, message: &str);
}

struct RoomConnection {
    room_id: String,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
pub struct InMemoryConnectionManager {
    // connection_id -> room + outbound sender
    connections: Arc<RwLock<HashMap<String, RoomConnection>>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connection_count(&self, room_id: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.room_id == room_id)
            .count()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(
        &self,
        room_id: &str,
        connection_id: String,
        sender: mpsc::UnboundedSender<String>,
    ) {
        let mut connections = self.connections.write().await;
        connections.insert(
            connection_id,
            RoomConnection {
                room_id: room_id.to_string(),
                sender,
            },
        );
    }

    async fn remove_connection(&self, connection_id: &str) {
        let mut connections = self.connections.write().await;
        connections.remove(connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(connection_id) {
            let _ = connection.sender.send(message.to_string());
        }
    }

    async fn send_to_room(&self, room_id: &str, message: &str) {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for connection in connections.values().filter(|c| c.room_id == room_id) {
            if connection.sender.send(message.to_string()).is_ok() {
                delivered += 1;
            }
        }
        debug!(room_id = %room_id, delivered, "Message sent to room");
    }
}
