use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::RoomEvent;

const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Event bus for distributing room events throughout the application
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    /// Room-specific event channels: room_id -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an event to all subscribers of a specific room
    pub async fn emit_to_room(&self, room_id: &str, event: RoomEvent) {
        let event_type = event.event_type();
        let sender = self.sender_for(room_id).await;

        match sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    room_id = %room_id,
                    event = event_type,
                    receivers = receiver_count,
                    "Room event emitted"
                );
            }
            Err(_) => {
                debug!(
                    room_id = %room_id,
                    event = event_type,
                    "Room event emitted with no receivers"
                );
            }
        }
    }

    /// Subscribe to events for a specific room
    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        self.sender_for(room_id).await.subscribe()
    }

    /// Returns the room's sender, creating the channel on first use
    async fn sender_for(&self, room_id: &str) -> broadcast::Sender<RoomEvent> {
        if let Some(sender) = self.room_channels.read().await.get(room_id) {
            return sender.clone();
        }

        let mut room_channels = self.room_channels.write().await;
        room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| {
                debug!(room_id = %room_id, "Creating room channel");
                broadcast::channel(ROOM_CHANNEL_CAPACITY).0
            })
            .clone()
    }
}
