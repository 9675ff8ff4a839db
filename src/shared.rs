use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::autodraw::{AutoDrawManager, AutoDrawRoomSubscriber};
use crate::event::{EventBus, RoomSubscription};
use crate::game::{DrawEngine, GameError};
use crate::room::repository::RoomRepository;
use crate::room::{RoomCommandSubscriber, RoomService};
use crate::websockets::{ConnectionManager, WebSocketRoomSubscriber};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub event_bus: EventBus,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub autodraw: Arc<AutoDrawManager>,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        draw_engine: DrawEngine,
        connection_manager: Arc<dyn ConnectionManager>,
        default_interval_seconds: u32,
    ) -> Self {
        let event_bus = EventBus::new();
        let room_service = Arc::new(
            RoomService::new(room_repository, draw_engine, event_bus.clone())
                .with_default_interval(default_interval_seconds),
        );
        let autodraw = Arc::new(AutoDrawManager::new(Arc::clone(&room_service)));

        Self {
            room_service,
            event_bus,
            connection_manager,
            autodraw,
        }
    }

    /// Wires a room's event channel to the WebSocket broadcaster, the command
    /// handler and the autodraw timer. Call once per room.
    pub async fn start_room_subscriptions(&self, room_id: &str) {
        let websocket_subscriber =
            WebSocketRoomSubscriber::new(Arc::clone(&self.connection_manager));
        let command_subscriber = RoomCommandSubscriber::new(Arc::clone(&self.room_service));
        let autodraw_subscriber = AutoDrawRoomSubscriber::new(Arc::clone(&self.autodraw));

        RoomSubscription::new(
            room_id.to_string(),
            Arc::new(websocket_subscriber),
            self.event_bus.clone(),
        )
        .start()
        .await;
        RoomSubscription::new(
            room_id.to_string(),
            Arc::new(command_subscriber),
            self.event_bus.clone(),
        )
        .start()
        .await;
        RoomSubscription::new(
            room_id.to_string(),
            Arc::new(autodraw_subscriber),
            self.event_bus.clone(),
        )
        .start()
        .await;

        info!(room_id = %room_id, "Room subscriptions started");
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::RoomNotFound(_) | AppError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Game(GameError::InvalidNumber(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Game(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::BadRequest(msg) | AppError::Conflict(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
