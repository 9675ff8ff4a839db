use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::WinnerMode;
use crate::room::models::RoomModel;

/// Message types for WebSocket communication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    Draw,
    PauseAutodraw,
    ResumeAutodraw,

    // Server -> Client
    RoomState,
    NumberDrawn,
    Winners,
    DrawUnavailable,
    AutodrawChanged,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
    pub connection_id: Option<String>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatePayload {
    pub room: RoomModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberDrawnPayload {
    pub number: u8,
    pub room: RoomModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnersPayload {
    pub mode: WinnerMode,
    /// Players who won on the latest draw
    pub new_winners: Vec<String>,
    /// Every winner so far, in rank order
    pub winners: Vec<String>,
    pub room: RoomModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawUnavailablePayload {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutodrawChangedPayload {
    pub is_paused: bool,
    pub interval_seconds: u32,
    pub room: RoomModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

fn to_payload<T: Serialize>(payload: T) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
                connection_id: None,
            }),
        }
    }

    /// Create a ROOM_STATE message carrying the full room
    pub fn room_state(room: &RoomModel) -> Self {
        Self::new(
            MessageType::RoomState,
            to_payload(RoomStatePayload { room: room.clone() }),
        )
    }

    /// Create a NUMBER_DRAWN message
    pub fn number_drawn(number: u8, room: &RoomModel) -> Self {
        Self::new(
            MessageType::NumberDrawn,
            to_payload(NumberDrawnPayload {
                number,
                room: room.clone(),
            }),
        )
    }

    /// Create a WINNERS message
    pub fn winners(new_winners: Vec<String>, room: &RoomModel) -> Self {
        Self::new(
            MessageType::Winners,
            to_payload(WinnersPayload {
                mode: room.winners.mode(),
                new_winners,
                winners: room.winners.ids(),
                room: room.clone(),
            }),
        )
    }

    /// Create a DRAW_UNAVAILABLE message
    pub fn draw_unavailable(reason: String) -> Self {
        Self::new(
            MessageType::DrawUnavailable,
            to_payload(DrawUnavailablePayload { reason }),
        )
    }

    /// Create an AUTODRAW_CHANGED message
    pub fn autodraw_changed(room: &RoomModel) -> Self {
        Self::new(
            MessageType::AutodrawChanged,
            to_payload(AutodrawChangedPayload {
                is_paused: room.draw.is_paused,
                interval_seconds: room.draw.interval_seconds,
                room: room.clone(),
            }),
        )
    }

    /// Create an ERROR message
    pub fn error(message: String) -> Self {
        Self::new(MessageType::Error, to_payload(ErrorPayload { message }))
    }

    pub fn draw() -> Self {
        Self::new(MessageType::Draw, serde_json::json!({}))
    }

    pub fn pause_autodraw() -> Self {
        Self::new(MessageType::PauseAutodraw, serde_json::json!({}))
    }

    pub fn resume_autodraw() -> Self {
        Self::new(MessageType::ResumeAutodraw, serde_json::json!({}))
    }
}
