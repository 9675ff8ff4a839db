use serde_json;
use tokio::time::{sleep, Duration, Instant};

use bingo::{
    event::RoomEvent,
    websockets::{MessageHandler, WebSocketMessage},
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a WebSocket message from a connection and wait for processing
    pub async fn send_message(&self, connection_id: &str, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.send_raw(connection_id, &message_json).await;
    }

    /// Send raw text as if it came off the socket
    pub async fn send_raw(&self, connection_id: &str, text: &str) {
        self.input_handler
            .handle_message(connection_id, &self.room_id, text.to_string())
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    /// Emit a room event and wait for processing
    pub async fn emit_event(&self, event: RoomEvent) {
        self.app_state
            .event_bus
            .emit_to_room(&self.room_id, event)
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    /// Wait until `connection_id` has at least `count` queued messages
    pub async fn wait_for_messages(&self, connection_id: &str, count: usize, within: Duration) {
        let deadline = Instant::now() + within;
        while Instant::now() < deadline {
            if self.mock_conn_manager.get_messages_for(connection_id).await.len() >= count {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "{} expected {} messages within {:?}, got {}",
            connection_id,
            count,
            within,
            self.mock_conn_manager.get_messages_for(connection_id).await.len()
        );
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn send_draw(&self, connection_id: &str) {
        self.send_message(connection_id, WebSocketMessage::draw()).await;
    }

    pub async fn send_pause(&self, connection_id: &str) {
        self.send_message(connection_id, WebSocketMessage::pause_autodraw())
            .await;
    }

    pub async fn send_resume(&self, connection_id: &str) {
        self.send_message(connection_id, WebSocketMessage::resume_autodraw())
            .await;
    }

    /// Records every number on `player`'s card except `last` through the
    /// service, leaving the player one number short of a blackout. Clears the
    /// resulting broadcasts.
    pub async fn bring_to_brink(&self, player: &str, last: u8) {
        let numbers: Vec<u8> = self
            .player(player)
            .card
            .numbers()
            .filter(|n| *n != last)
            .collect();
        for number in numbers {
            self.app_state
                .room_service
                .record_number(&self.room_id, i64::from(number))
                .await
                .unwrap();
        }
        sleep(Duration::from_millis(20)).await;
        self.clear_messages().await;
    }
}
