// Library crate for the bingo server
// This file exposes the public API for the binary and integration tests

pub mod autodraw;
pub mod config;
pub mod event;
pub mod game;
pub mod room;
pub mod shared;
pub mod suggestion;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use autodraw::AutoDrawManager;
pub use config::ServerConfig;
pub use event::{EventBus, RoomEvent, RoomSubscription};
pub use game::DrawEngine;
pub use room::{models::RoomModel, repository::RoomRepository, RoomService};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, WebSocketMessage, WebSocketRoomSubscriber,
    WebsocketReceiveHandler,
};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// HTTP and WebSocket routes for the bingo server
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Bingo server" }))
        .route("/rooms", post(room::create_room).get(room::list_rooms))
        .route("/rooms/:room_id", get(room::get_room))
        .route("/rooms/:room_id/players", post(room::join_room))
        .route(
            "/rooms/:room_id/players/:player_id",
            get(room::get_player_view),
        )
        .route("/rooms/:room_id/draw", post(room::draw_number))
        .route("/rooms/:room_id/numbers", post(room::record_number))
        .route("/rooms/:room_id/autodraw", post(room::set_autodraw))
        .route("/ws/:room_id", get(websockets::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
