use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{generate_card, Card, RoomRules, WinRule, WinnerMode, POOL_SIZE};

/// Seconds between autodraw ticks when a room doesn't choose its own interval
pub const DEFAULT_DRAW_INTERVAL_SECS: u32 = 10;

/// A participant in a room and the card they were dealt on joining
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub card: Card,
}

impl Player {
    /// Creates a player with a fresh random id and card
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            card: generate_card(),
        }
    }
}

/// Numbers drawn so far plus the autodraw settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawState {
    /// Draw order, no duplicates, never shrinks
    pub drawn_numbers: Vec<u8>,
    pub is_paused: bool,
    pub interval_seconds: u32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            drawn_numbers: Vec::new(),
            is_paused: true,
            interval_seconds: DEFAULT_DRAW_INTERVAL_SECS,
        }
    }
}

/// Winner bookkeeping. A room uses exactly one scheme for its whole life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Winners {
    /// First winner ends the game
    Single { winner: Option<String> },
    /// Winners in the order they completed; the draw carries on
    Ranked { winners: Vec<String> },
}

impl Winners {
    pub fn for_mode(mode: WinnerMode) -> Self {
        match mode {
            WinnerMode::Single => Winners::Single { winner: None },
            WinnerMode::Ranked => Winners::Ranked {
                winners: Vec::new(),
            },
        }
    }

    pub fn mode(&self) -> WinnerMode {
        match self {
            Winners::Single { .. } => WinnerMode::Single,
            Winners::Ranked { .. } => WinnerMode::Ranked,
        }
    }

    /// True once a single-winner game has its winner
    pub fn is_finalized(&self) -> bool {
        matches!(self, Winners::Single { winner: Some(_) })
    }

    pub fn contains(&self, player_id: &str) -> bool {
        match self {
            Winners::Single { winner } => winner.as_deref() == Some(player_id),
            Winners::Ranked { winners } => winners.iter().any(|w| w == player_id),
        }
    }

    /// Winner ids in rank order
    pub fn ids(&self) -> Vec<String> {
        match self {
            Winners::Single { winner } => winner.iter().cloned().collect(),
            Winners::Ranked { winners } => winners.clone(),
        }
    }
}

/// Full room document, stored and broadcast as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomModel {
    pub id: String, // Random pet name generated ID
    pub name: String,
    pub players: Vec<Player>,
    pub draw: DrawState,
    pub win_rule: WinRule,
    pub winners: Winners,
    /// Bumped on every write; used for optimistic concurrency
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a new room model with generated ID
    pub fn new(name: String, rules: RoomRules) -> Self {
        let room_id = petname::Petnames::default().generate_one(2, "-");

        Self {
            id: room_id,
            name,
            players: vec![],
            draw: DrawState::default(),
            win_rule: rules.win_rule,
            winners: Winners::for_mode(rules.winner_mode),
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn rules(&self) -> RoomRules {
        RoomRules {
            win_rule: self.win_rule,
            winner_mode: self.winners.mode(),
        }
    }

    pub fn get_player_count(&self) -> usize {
        self.players.len()
    }

    pub fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.get_player(player_id).is_some()
    }

    pub fn add_player(&mut self, player: Player) {
        if !self.has_player(&player.id) {
            self.players.push(player);
        }
    }

    pub fn last_drawn_number(&self) -> Option<u8> {
        self.draw.drawn_numbers.last().copied()
    }

    pub fn is_pool_exhausted(&self) -> bool {
        self.draw.drawn_numbers.len() >= POOL_SIZE as usize
    }

    /// No further draws can happen: a single winner is in, or every number is out
    pub fn is_finished(&self) -> bool {
        self.winners.is_finalized() || self.is_pool_exhausted()
    }
}
