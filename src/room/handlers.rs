use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    models::{Player, RoomModel},
    service::AutoDrawChange,
    types::{
        AutoDrawAction, AutoDrawRequest, DrawResponse, JoinRoomRequest, PlayerView,
        RecordNumberRequest, RoomCreateRequest, RoomSummary,
    },
};
use crate::shared::{AppError, AppState};

/// POST /rooms
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomModel>, AppError> {
    let room = state.room_service.create_room(request).await?;
    state.start_room_subscriptions(&room.id).await;

    Ok(Json(room))
}

/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = state.room_service.list_rooms().await?;
    Ok(Json(rooms))
}

/// GET /rooms/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomModel>, AppError> {
    let room = state.room_service.get_room_details(&room_id).await?;
    Ok(Json(room))
}

/// POST /rooms/:room_id/players
///
/// Returns the new player including their card. The player id is the
/// only credential a client has, so it is returned once here.
#[instrument(name = "join_room", skip(state))]
pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<Player>, AppError> {
    let player = state.room_service.join_room(&room_id, &request.name).await?;

    info!(room_id = %room_id, player_id = %player.id, "Player joined via HTTP");

    Ok(Json(player))
}

/// GET /rooms/:room_id/players/:player_id
#[instrument(name = "get_player_view", skip(state))]
pub async fn get_player_view(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> Result<Json<PlayerView>, AppError> {
    let view = state
        .room_service
        .get_player_view(&room_id, &player_id)
        .await?;
    Ok(Json(view))
}

/// POST /rooms/:room_id/draw
#[instrument(name = "draw_number", skip(state))]
pub async fn draw_number(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<DrawResponse>, AppError> {
    let outcome = state.room_service.draw_number(&room_id).await?;
    Ok(Json(outcome.into()))
}

/// POST /rooms/:room_id/numbers
#[instrument(name = "record_number", skip(state))]
pub async fn record_number(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<RecordNumberRequest>,
) -> Result<Json<DrawResponse>, AppError> {
    let outcome = state
        .room_service
        .record_number(&room_id, request.number)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /rooms/:room_id/autodraw
#[instrument(name = "set_autodraw", skip(state))]
pub async fn set_autodraw(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<AutoDrawRequest>,
) -> Result<Json<RoomModel>, AppError> {
    let change = AutoDrawChange {
        paused: request.action == AutoDrawAction::Pause,
        interval_seconds: request.interval_seconds,
    };

    let room = state.room_service.set_autodraw(&room_id, change).await?;
    Ok(Json(room))
}
