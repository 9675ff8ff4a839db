use async_trait::async_trait;
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::{EventBus, RoomEvent};
use crate::shared::{AppError, AppState};
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::messages::{MessageType, WebSocketMessage};

use super::socket::{Connection, MessageHandler};

/// Turns client messages into room events
pub struct WebsocketReceiveHandler {
    event_bus: EventBus,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl WebsocketReceiveHandler {
    pub fn new(event_bus: EventBus, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            event_bus,
            connection_manager,
        }
    }

    async fn reply_error(&self, connection_id: &str, message: String) {
        if let Ok(json) = serde_json::to_string(&WebSocketMessage::error(message)) {
            self.connection_manager
                .send_to_connection(connection_id, &json)
                .await;
        }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &str, room_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            message = %message,
            "Received message"
        );

        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    room_id = %room_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.reply_error(connection_id, format!("Invalid message: {}", e))
                    .await;
                return;
            }
        };

        let event = match ws_message.message_type {
            MessageType::Draw => RoomEvent::DrawRequested {
                requested_by: connection_id.to_string(),
            },
            MessageType::PauseAutodraw => RoomEvent::AutoDrawRequested {
                requested_by: connection_id.to_string(),
                paused: true,
            },
            MessageType::ResumeAutodraw => RoomEvent::AutoDrawRequested {
                requested_by: connection_id.to_string(),
                paused: false,
            },
            other => {
                debug!(message_type = ?other, "Ignoring server-only message type");
                self.reply_error(
                    connection_id,
                    format!("Unsupported message type: {:?}", other),
                )
                .await;
                return;
            }
        };

        self.event_bus.emit_to_room(room_id, event).await;
    }
}

/// WebSocket endpoint for watching a room
/// GET /ws/:room_id
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    info!(room_id = %room_id, "WebSocket connection requested");

    // Reject before upgrading so the client gets a proper 404
    let room = app_state.room_service.get_room_details(&room_id).await?;

    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, room.id, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    room_id: String,
    app_state: AppState,
) {
    let connection_id = Uuid::new_v4().to_string();

    info!(
        room_id = %room_id,
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connection_manager
        .add_connection(&room_id, connection_id.clone(), outbound_sender.clone())
        .await;

    // Send the current room so the client can render before the next change
    match app_state.room_service.get_room(&room_id).await {
        Ok(Some(room)) => match serde_json::to_string(&WebSocketMessage::room_state(&room)) {
            Ok(message_json) => {
                let _ = outbound_sender.send(message_json);
                debug!(
                    room_id = %room_id,
                    connection_id = %connection_id,
                    "Sent initial ROOM_STATE"
                );
            }
            Err(e) => warn!(room_id = %room_id, error = %e, "Failed to encode ROOM_STATE"),
        },
        Ok(None) => warn!(room_id = %room_id, "Room vanished before initial ROOM_STATE"),
        Err(e) => warn!(room_id = %room_id, error = %e, "Failed to load room for ROOM_STATE"),
    }

    let message_handler = Arc::new(WebsocketReceiveHandler::new(
        app_state.event_bus.clone(),
        Arc::clone(&app_state.connection_manager),
    ));

    let connection = Connection::new(
        connection_id.clone(),
        room_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(
                room_id = %room_id,
                connection_id = %connection_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                room_id = %room_id,
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    app_state
        .connection_manager
        .remove_connection(&connection_id)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websockets::InMemoryConnectionManager;
    use tokio::sync::broadcast;

    async fn setup() -> (
        WebsocketReceiveHandler,
        broadcast::Receiver<RoomEvent>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let bus = EventBus::new();
        let events = bus.subscribe_to_room("room-1").await;
        let connections = Arc::new(InMemoryConnectionManager::new());
        let (tx, rx) = mpsc::unbounded_channel();
        connections
            .add_connection("room-1", "conn-1".to_string(), tx)
            .await;

        (WebsocketReceiveHandler::new(bus, connections), events, rx)
    }

    #[tokio::test]
    async fn test_draw_message_emits_draw_request() {
        let (handler, mut events, _) = setup().await;

        handler
            .handle_message("conn-1", "room-1", r#"{"type": "DRAW", "payload": {}}"#.to_string())
            .await;

        match events.try_recv().unwrap() {
            RoomEvent::DrawRequested { requested_by } => assert_eq!(requested_by, "conn-1"),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pause_and_resume_messages() {
        let (handler, mut events, _) = setup().await;

        let pause = serde_json::to_string(&WebSocketMessage::pause_autodraw()).unwrap();
        let resume = serde_json::to_string(&WebSocketMessage::resume_autodraw()).unwrap();
        handler.handle_message("conn-1", "room-1", pause).await;
        handler.handle_message("conn-1", "room-1", resume).await;

        assert!(matches!(
            events.try_recv().unwrap(),
            RoomEvent::AutoDrawRequested { paused: true, .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            RoomEvent::AutoDrawRequested { paused: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_message_gets_error_reply() {
        let (handler, mut events, mut outbound) = setup().await;

        handler
            .handle_message("conn-1", "room-1", "not json".to_string())
            .await;

        assert!(events.try_recv().is_err());
        let reply: WebSocketMessage = serde_json::from_str(&outbound.try_recv().unwrap()).unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
    }

    #[tokio::test]
    async fn test_server_message_type_from_client_is_rejected() {
        let (handler, mut events, mut outbound) = setup().await;

        handler
            .handle_message("conn-1", "room-1", r#"{"type": "ROOM_STATE"}"#.to_string())
            .await;

        assert!(events.try_recv().is_err());
        let reply: WebSocketMessage = serde_json::from_str(&outbound.try_recv().unwrap()).unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
        assert!(reply.payload["message"]
            .as_str()
            .unwrap()
            .contains("RoomState"));
    }
}
