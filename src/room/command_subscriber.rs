use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::service::{AutoDrawChange, RoomService};
use crate::event::{RoomEvent, RoomEventError, RoomEventHandler};
use crate::game::GameError;
use crate::shared::AppError;

/// Carries out draw and autodraw requests that arrive over WebSockets
pub struct RoomCommandSubscriber {
    room_service: Arc<RoomService>,
}

impl RoomCommandSubscriber {
    pub fn new(room_service: Arc<RoomService>) -> Self {
        Self { room_service }
    }

    async fn handle_draw_requested(
        &self,
        room_id: &str,
        requested_by: &str,
    ) -> Result<(), RoomEventError> {
        info!(room_id = %room_id, requested_by = %requested_by, "Draw requested");

        match self.room_service.draw_number(room_id).await {
            Ok(_) => Ok(()),
            // Already announced to the room as DrawUnavailable
            Err(AppError::Game(GameError::ExhaustedPool | GameError::GameAlreadyWon)) => {
                debug!(room_id = %room_id, "Requested draw not possible");
                Ok(())
            }
            Err(e) => Err(map_error(room_id, e)),
        }
    }

    async fn handle_autodraw_requested(
        &self,
        room_id: &str,
        requested_by: &str,
        paused: bool,
    ) -> Result<(), RoomEventError> {
        info!(
            room_id = %room_id,
            requested_by = %requested_by,
            paused,
            "Autodraw change requested"
        );

        self.room_service
            .set_autodraw(
                room_id,
                AutoDrawChange {
                    paused,
                    interval_seconds: None,
                },
            )
            .await
            .map(|_| ())
            .map_err(|e| map_error(room_id, e))
    }
}

fn map_error(room_id: &str, error: AppError) -> RoomEventError {
    match error {
        AppError::RoomNotFound(_) => RoomEventError::RoomNotFound(room_id.to_string()),
        other => RoomEventError::HandlerError(other.to_string()),
    }
}

#[async_trait]
impl RoomEventHandler for RoomCommandSubscriber {
    async fn handle_room_event(
        &self,
        room_id: &str,
        event: RoomEvent,
    ) -> Result<(), RoomEventError> {
        match event {
            RoomEvent::DrawRequested { requested_by } => {
                self.handle_draw_requested(room_id, &requested_by).await
            }
            RoomEvent::AutoDrawRequested {
                requested_by,
                paused,
            } => {
                self.handle_autodraw_requested(room_id, &requested_by, paused)
                    .await
            }
            _ => Ok(()),
        }
    }

    fn handler_name(&self) -> &'static str {
        "RoomCommandSubscriber"
    }
}
