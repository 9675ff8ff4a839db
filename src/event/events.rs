use serde::{Deserialize, Serialize};

use crate::room::models::RoomModel;

/// Events scoped to a single bingo room
///
/// Request events (`*Requested`) come from connected clients and are acted on
/// by subscribers. The rest describe state changes that already happened and
/// carry the room snapshot they produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEvent {
    /// A client asked for the next number
    DrawRequested { requested_by: String },

    /// A client asked to pause or resume the autodraw timer
    AutoDrawRequested { requested_by: String, paused: bool },

    /// A player joined and was dealt a card
    PlayerJoined { player_id: String, room: RoomModel },

    /// A number was added to the draw
    NumberDrawn { number: u8, room: RoomModel },

    /// One or more players completed their card on the latest draw
    WinnersDeclared {
        new_winners: Vec<String>,
        room: RoomModel,
    },

    /// A draw was attempted but no number can be drawn
    DrawUnavailable { reason: String },

    /// Autodraw was paused, resumed or had its interval changed
    AutoDrawChanged { room: RoomModel },
}

impl RoomEvent {
    /// Short name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::DrawRequested { .. } => "draw_requested",
            RoomEvent::AutoDrawRequested { .. } => "autodraw_requested",
            RoomEvent::PlayerJoined { .. } => "player_joined",
            RoomEvent::NumberDrawn { .. } => "number_drawn",
            RoomEvent::WinnersDeclared { .. } => "winners_declared",
            RoomEvent::DrawUnavailable { .. } => "draw_unavailable",
            RoomEvent::AutoDrawChanged { .. } => "autodraw_changed",
        }
    }
}
