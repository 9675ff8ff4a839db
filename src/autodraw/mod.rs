// Public API
pub use autodraw_room_subscriber::AutoDrawRoomSubscriber;
pub use manager::AutoDrawManager;

// Internal modules
mod autodraw_room_subscriber;
mod manager;
