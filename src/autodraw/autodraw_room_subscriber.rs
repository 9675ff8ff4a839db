use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::manager::AutoDrawManager;
use crate::event::{RoomEvent, RoomEventError, RoomEventHandler};

/// Keeps the room's draw timer in step with its stored autodraw settings
pub struct AutoDrawRoomSubscriber {
    manager: Arc<AutoDrawManager>,
}

impl AutoDrawRoomSubscriber {
    pub fn new(manager: Arc<AutoDrawManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl RoomEventHandler for AutoDrawRoomSubscriber {
    async fn handle_room_event(
        &self,
        room_id: &str,
        event: RoomEvent,
    ) -> Result<(), RoomEventError> {
        match event {
            RoomEvent::AutoDrawChanged { room } => {
                debug!(
                    room_id = %room_id,
                    is_paused = room.draw.is_paused,
                    interval_seconds = room.draw.interval_seconds,
                    "Syncing autodraw timer"
                );
                self.manager.sync(&room).await;
            }
            // Covers draws made outside the timer
            RoomEvent::NumberDrawn { room, .. } if room.is_finished() => {
                debug!(room_id = %room_id, "Game finished, stopping autodraw timer");
                self.manager.stop(room_id).await;
            }
            _ => {}
        }

        Ok(())
    }

    fn handler_name(&self) -> &'static str {
        "AutoDrawRoomSubscriber"
    }
}
