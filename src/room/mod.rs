// Public API - what other modules can use
pub use handlers::{
    create_room, draw_number, get_player_view, get_room, join_room, list_rooms, record_number,
    set_autodraw,
};
pub use command_subscriber::RoomCommandSubscriber;
pub use reconciler::{apply_draw, DrawOutcome};
pub use service::{AutoDrawChange, RoomService};

// Internal modules
mod command_subscriber;
mod handlers;
pub mod models;
mod reconciler;
pub mod repository;
mod service;
pub mod types;
