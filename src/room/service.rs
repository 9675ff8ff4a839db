use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{Player, RoomModel, DEFAULT_DRAW_INTERVAL_SECS},
    reconciler::{apply_draw, DrawOutcome},
    repository::{JoinRoomResult, RoomRepository, UpdateRoomResult},
    types::{PlayerView, RoomCreateRequest, RoomSummary},
};
use crate::event::{EventBus, RoomEvent};
use crate::game::{DrawEngine, GameError, RoomRules, POOL_SIZE};
use crate::shared::AppError;

/// Read-compute-write attempts before a contended room gives up
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Requested change to a room's autodraw settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoDrawChange {
    pub paused: bool,
    pub interval_seconds: Option<u32>,
}

/// Service for handling room business logic
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    draw_engine: DrawEngine,
    event_bus: EventBus,
    default_interval_seconds: u32,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        draw_engine: DrawEngine,
        event_bus: EventBus,
    ) -> Self {
        Self {
            repository,
            draw_engine,
            event_bus,
            default_interval_seconds: DEFAULT_DRAW_INTERVAL_SECS,
        }
    }

    /// Autodraw interval given to rooms created from now on
    pub fn with_default_interval(mut self, seconds: u32) -> Self {
        self.default_interval_seconds = seconds;
        self
    }

    /// Creates a new room with a generated ID and the requested rules
    #[instrument(skip(self))]
    pub async fn create_room(&self, request: RoomCreateRequest) -> Result<RoomModel, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Room name must not be empty".to_string()));
        }

        let defaults = RoomRules::default();
        let rules = RoomRules {
            win_rule: request.win_rule.unwrap_or(defaults.win_rule),
            winner_mode: request.winner_mode.unwrap_or(defaults.winner_mode),
        };

        let mut room = RoomModel::new(name.to_string(), rules);
        room.draw.interval_seconds = self.default_interval_seconds;
        debug!(room_id = %room.id, "Generated room ID");

        self.repository.create_room(&room).await?;

        info!(
            room_id = %room.id,
            win_rule = %rules.win_rule,
            winner_mode = %rules.winner_mode,
            "Room created successfully"
        );

        Ok(room)
    }

    /// Gets the full room model for internal use (WebSocket handlers, etc.)
    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        debug!(room_id = %room_id, "Getting room model");
        self.repository.get_room(room_id).await
    }

    /// Gets a room or fails with `RoomNotFound`
    pub async fn get_room_details(&self, room_id: &str) -> Result<RoomModel, AppError> {
        self.get_room(room_id)
            .await?
            .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))
    }

    /// Lists all rooms, oldest first
    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, AppError> {
        let rooms = self.repository.list_rooms().await?;
        info!(room_count = rooms.len(), "Rooms retrieved successfully");

        Ok(rooms.iter().map(RoomSummary::from).collect())
    }

    /// Adds a new player with a freshly generated card
    #[instrument(skip(self))]
    pub async fn join_room(&self, room_id: &str, player_name: &str) -> Result<Player, AppError> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(AppError::BadRequest("Player name must not be empty".to_string()));
        }

        let player = Player::new(player_name.to_string());
        let player_id = player.id.clone();

        match self.repository.try_join_room(room_id, player.clone()).await? {
            JoinRoomResult::Success(room) => {
                info!(
                    room_id = %room_id,
                    player_id = %player_id,
                    new_player_count = room.get_player_count(),
                    "Player joined room successfully"
                );

                self.event_bus
                    .emit_to_room(room_id, RoomEvent::PlayerJoined { player_id, room })
                    .await;

                Ok(player)
            }
            JoinRoomResult::GameAlreadyWon => Err(GameError::GameAlreadyWon.into()),
            JoinRoomResult::RoomNotFound => Err(AppError::RoomNotFound(room_id.to_string())),
        }
    }

    /// Card, marks and draw progress for one player
    #[instrument(skip(self))]
    pub async fn get_player_view(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<PlayerView, AppError> {
        let room = self.get_room_details(room_id).await?;
        let player = room
            .get_player(player_id)
            .cloned()
            .ok_or_else(|| AppError::PlayerNotFound(player_id.to_string()))?;

        Ok(PlayerView::new(&room, player))
    }

    /// Draws the next number, applies it and stores the result.
    ///
    /// On a version conflict the room is re-read and the draw recomputed, so a
    /// number is only ever applied by a single write.
    #[instrument(skip(self))]
    pub async fn draw_number(&self, room_id: &str) -> Result<DrawOutcome, AppError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let room = self.get_room_details(room_id).await?;

            let outcome = self.compute_draw(&room).await?;
            if let Some(stored) = self.store(&outcome.room, attempt).await? {
                return Ok(self.publish_draw(&room, outcome, stored).await);
            }
        }

        Err(self.conflict(room_id))
    }

    /// One autodraw cycle. Returns `Ok(None)` without drawing when the stored
    /// room is paused or finished, so a tick that lost the race against a
    /// pause or a manual win does nothing.
    #[instrument(skip(self))]
    pub async fn autodraw_tick(&self, room_id: &str) -> Result<Option<DrawOutcome>, AppError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let room = self.get_room_details(room_id).await?;

            if room.draw.is_paused || room.is_finished() {
                debug!(
                    room_id = %room_id,
                    is_paused = room.draw.is_paused,
                    "Autodraw tick skipped"
                );
                return Ok(None);
            }

            let outcome = self.compute_draw(&room).await?;
            if let Some(stored) = self.store(&outcome.room, attempt).await? {
                return Ok(Some(self.publish_draw(&room, outcome, stored).await));
            }
        }

        Err(self.conflict(room_id))
    }

    /// Records a number picked outside the server. Re-recording a number that
    /// is already drawn changes nothing and returns the current room.
    #[instrument(skip(self))]
    pub async fn record_number(&self, room_id: &str, number: i64) -> Result<DrawOutcome, AppError> {
        let number = u8::try_from(number)
            .ok()
            .filter(|n| (1..=POOL_SIZE).contains(n))
            .ok_or(GameError::InvalidNumber(number))?;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let room = self.get_room_details(room_id).await?;

            let outcome = match apply_draw(&room, number) {
                Ok(outcome) => outcome,
                Err(GameError::DuplicateDraw(_)) => {
                    debug!(room_id = %room_id, number, "Number already drawn, nothing to record");
                    return Ok(DrawOutcome {
                        room,
                        number,
                        new_winners: Vec::new(),
                    });
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(stored) = self.store(&outcome.room, attempt).await? {
                return Ok(self.publish_draw(&room, outcome, stored).await);
            }
        }

        Err(self.conflict(room_id))
    }

    /// Pauses or resumes autodraw and optionally changes its interval
    #[instrument(skip(self))]
    pub async fn set_autodraw(
        &self,
        room_id: &str,
        change: AutoDrawChange,
    ) -> Result<RoomModel, AppError> {
        if change.interval_seconds == Some(0) {
            return Err(AppError::BadRequest(
                "Autodraw interval must be at least one second".to_string(),
            ));
        }

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let room = self.get_room_details(room_id).await?;

            if !change.paused {
                if room.winners.is_finalized() {
                    return Err(GameError::GameAlreadyWon.into());
                }
                if room.is_pool_exhausted() {
                    return Err(GameError::ExhaustedPool.into());
                }
            }

            let mut next = room.clone();
            next.draw.is_paused = change.paused;
            if let Some(interval_seconds) = change.interval_seconds {
                next.draw.interval_seconds = interval_seconds;
            }

            if next.draw == room.draw {
                debug!(room_id = %room_id, "Autodraw settings unchanged");
                return Ok(room);
            }

            if let Some(stored) = self.store(&next, attempt).await? {
                info!(
                    room_id = %room_id,
                    is_paused = stored.draw.is_paused,
                    interval_seconds = stored.draw.interval_seconds,
                    "Autodraw settings changed"
                );

                self.event_bus
                    .emit_to_room(
                        room_id,
                        RoomEvent::AutoDrawChanged {
                            room: stored.clone(),
                        },
                    )
                    .await;

                return Ok(stored);
            }
        }

        Err(self.conflict(room_id))
    }

    /// Versioned write. `Ok(None)` means another writer got there first.
    async fn store(&self, room: &RoomModel, attempt: u32) -> Result<Option<RoomModel>, AppError> {
        match self.repository.try_update_room(room).await? {
            UpdateRoomResult::Success(stored) => Ok(Some(stored)),
            UpdateRoomResult::VersionConflict { current_version } => {
                debug!(
                    room_id = %room.id,
                    attempt,
                    expected_version = room.version,
                    current_version,
                    "Room changed underneath us, retrying"
                );
                Ok(None)
            }
            UpdateRoomResult::RoomNotFound => Err(AppError::RoomNotFound(room.id.clone())),
        }
    }

    /// Picks a number for `room` and applies it, announcing when no draw is possible
    async fn compute_draw(&self, room: &RoomModel) -> Result<DrawOutcome, AppError> {
        if room.winners.is_finalized() {
            self.announce_draw_unavailable(&room.id, GameError::GameAlreadyWon)
                .await;
            return Err(GameError::GameAlreadyWon.into());
        }

        let number = match self.draw_engine.draw_next(&room.draw.drawn_numbers).await {
            Ok(number) => number,
            Err(e @ GameError::ExhaustedPool) => {
                self.announce_draw_unavailable(&room.id, e.clone()).await;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(apply_draw(room, number)?)
    }

    /// Emits the events for a stored draw. `previous` is the room the draw was
    /// computed from.
    async fn publish_draw(
        &self,
        previous: &RoomModel,
        outcome: DrawOutcome,
        stored: RoomModel,
    ) -> DrawOutcome {
        let outcome = DrawOutcome {
            room: stored,
            ..outcome
        };
        let room_id = outcome.room.id.as_str();

        info!(
            room_id = %room_id,
            number = outcome.number,
            drawn_count = outcome.room.draw.drawn_numbers.len(),
            new_winners = ?outcome.new_winners,
            "Number drawn"
        );

        self.event_bus
            .emit_to_room(
                room_id,
                RoomEvent::NumberDrawn {
                    number: outcome.number,
                    room: outcome.room.clone(),
                },
            )
            .await;

        if !outcome.new_winners.is_empty() {
            self.event_bus
                .emit_to_room(
                    room_id,
                    RoomEvent::WinnersDeclared {
                        new_winners: outcome.new_winners.clone(),
                        room: outcome.room.clone(),
                    },
                )
                .await;
        }

        // The draw finished the game and switched a running timer off
        if !previous.draw.is_paused && outcome.room.draw.is_paused {
            info!(room_id = %room_id, "Game finished, autodraw paused");
            self.event_bus
                .emit_to_room(
                    room_id,
                    RoomEvent::AutoDrawChanged {
                        room: outcome.room.clone(),
                    },
                )
                .await;
        }

        outcome
    }

    async fn announce_draw_unavailable(&self, room_id: &str, reason: GameError) {
        warn!(room_id = %room_id, reason = %reason, "Draw requested but none is possible");

        self.event_bus
            .emit_to_room(
                room_id,
                RoomEvent::DrawUnavailable {
                    reason: reason.to_string(),
                },
            )
            .await;
    }

    fn conflict(&self, room_id: &str) -> AppError {
        warn!(room_id = %room_id, attempts = MAX_WRITE_ATTEMPTS, "Giving up on contended room");
        AppError::Conflict(format!(
            "Room {} kept changing, please retry",
            room_id
        ))
    }
}
