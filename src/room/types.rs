use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Player, RoomModel};
use super::reconciler::DrawOutcome;
use crate::game::{marked_cells, MarkedCells, WinRule, WinnerMode};

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreateRequest {
    pub name: String,
    #[serde(default)]
    pub win_rule: Option<WinRule>,
    #[serde(default)]
    pub winner_mode: Option<WinnerMode>,
}

/// Request payload for joining a room
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub name: String,
}

/// Request payload for recording a number chosen outside the server
#[derive(Debug, Deserialize)]
pub struct RecordNumberRequest {
    pub number: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoDrawAction {
    Start,
    Pause,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDrawRequest {
    pub action: AutoDrawAction,
    #[serde(default)]
    pub interval_seconds: Option<u32>,
}

/// Compact room information for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub player_count: usize,
    pub drawn_count: usize,
    pub win_rule: WinRule,
    pub winner_mode: WinnerMode,
    pub is_finished: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&RoomModel> for RoomSummary {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            player_count: room.get_player_count(),
            drawn_count: room.draw.drawn_numbers.len(),
            win_rule: room.win_rule,
            winner_mode: room.winners.mode(),
            is_finished: room.is_finished(),
            created_at: room.created_at,
        }
    }
}

/// What a single player's screen needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub room_id: String,
    pub player: Player,
    pub marked: MarkedCells,
    pub drawn_numbers: Vec<u8>,
    pub last_number: Option<u8>,
    pub is_winner: bool,
}

impl PlayerView {
    pub fn new(room: &RoomModel, player: Player) -> Self {
        Self {
            room_id: room.id.clone(),
            marked: marked_cells(&player.card, &room.draw.drawn_numbers),
            drawn_numbers: room.draw.drawn_numbers.clone(),
            last_number: room.last_drawn_number(),
            is_winner: room.winners.contains(&player.id),
            player,
        }
    }
}

/// Response for draw and record-number requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponse {
    pub number: u8,
    pub new_winners: Vec<String>,
    pub room: RoomModel,
}

impl From<DrawOutcome> for DrawResponse {
    fn from(outcome: DrawOutcome) -> Self {
        Self {
            number: outcome.number,
            new_winners: outcome.new_winners,
            room: outcome.room,
        }
    }
}
