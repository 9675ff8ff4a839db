use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    event::{RoomEvent, RoomEventError, RoomEventHandler},
    websockets::connection_manager::ConnectionManager,
};

use super::messages::WebSocketMessage;

/// Forwards room state changes to every socket watching the room
///
/// Request events are skipped; they are acted on by the command subscriber
/// and show up here again as the state change they cause.
pub struct WebSocketRoomSubscriber {
    connection_manager: Arc<dyn ConnectionManager>,
}

impl WebSocketRoomSubscriber {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    async fn broadcast(&self, room_id: &str, message: WebSocketMessage) -> Result<(), RoomEventError> {
        let message_json = serde_json::to_string(&message)
            .map_err(|e| RoomEventError::HandlerError(format!("Failed to encode message: {}", e)))?;

        self.connection_manager
            .send_to_room(room_id, &message_json)
            .await;

        debug!(
            room_id = %room_id,
            message_type = ?message.message_type,
            "Broadcast to room connections"
        );
        Ok(())
    }
}

#[async_trait]
impl RoomEventHandler for WebSocketRoomSubscriber {
    async fn handle_room_event(
        &self,
        room_id: &str,
        event: RoomEvent,
    ) -> Result<(), RoomEventError> {
        info!(
            room_id = %room_id,
            event_type = event.event_type(),
            "Handling room event for WebSocket connections"
        );

        let message = match event {
            RoomEvent::PlayerJoined { room, .. } => WebSocketMessage::room_state(&room),
            RoomEvent::NumberDrawn { number, room } => WebSocketMessage::number_drawn(number, &room),
            RoomEvent::WinnersDeclared { new_winners, room } => {
                WebSocketMessage::winners(new_winners, &room)
            }
            RoomEvent::DrawUnavailable { reason } => WebSocketMessage::draw_unavailable(reason),
            RoomEvent::AutoDrawChanged { room } => WebSocketMessage::autodraw_changed(&room),
            RoomEvent::DrawRequested { .. } | RoomEvent::AutoDrawRequested { .. } => {
                return Ok(());
            }
        };

        self.broadcast(room_id, message).await
    }

    fn handler_name(&self) -> &'static str {
        "WebSocketRoomSubscriber"
    }
}
