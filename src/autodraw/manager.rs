use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::room::models::RoomModel;
use crate::room::{AutoDrawChange, RoomService};
use crate::shared::AppError;

struct AutoDrawTask {
    /// Dropping this ends the loop at its next wait
    _stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs one draw timer per room
#[derive(Clone)]
pub struct AutoDrawManager {
    room_service: Arc<RoomService>,
    tasks: Arc<RwLock<HashMap<String, AutoDrawTask>>>,
}

impl AutoDrawManager {
    pub fn new(room_service: Arc<RoomService>) -> Self {
        Self {
            room_service,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Starts or restarts the room's timer with the given period
    #[instrument(skip(self))]
    pub async fn start(&self, room_id: &str, period: Duration) {
        let (stop_sender, stop_receiver) = oneshot::channel();
        let handle = tokio::spawn(run_autodraw(
            Arc::clone(&self.room_service),
            room_id.to_string(),
            period,
            stop_receiver,
        ));

        let previous = self.tasks.write().await.insert(
            room_id.to_string(),
            AutoDrawTask {
                _stop: stop_sender,
                handle,
            },
        );

        info!(
            room_id = %room_id,
            period_ms = period.as_millis() as u64,
            restarted = previous.is_some(),
            "Autodraw started"
        );
    }

    /// Stops the room's timer. A draw already in progress still completes.
    #[instrument(skip(self))]
    pub async fn stop(&self, room_id: &str) {
        if self.tasks.write().await.remove(room_id).is_some() {
            info!(room_id = %room_id, "Autodraw stopped");
        }
    }

    pub async fn is_running(&self, room_id: &str) -> bool {
        self.tasks
            .read()
            .await
            .get(room_id)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Makes the timer match the room's stored settings
    pub async fn sync(&self, room: &RoomModel) {
        let should_run = !room.draw.is_paused && !room.is_finished();

        if should_run {
            self.start(
                &room.id,
                Duration::from_secs(u64::from(room.draw.interval_seconds)),
            )
            .await;
        } else {
            self.stop(&room.id).await;
        }
    }
}

async fn run_autodraw(
    room_service: Arc<RoomService>,
    room_id: String,
    period: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut stop => {
                debug!(room_id = %room_id, "Autodraw loop cancelled");
                return;
            }
        }

        match room_service.autodraw_tick(&room_id).await {
            Ok(None) => {
                debug!(room_id = %room_id, "Room paused or finished, autodraw ending");
                return;
            }
            Ok(Some(outcome)) if outcome.room.is_finished() => {
                info!(room_id = %room_id, number = outcome.number, "Game finished, autodraw ending");
                break;
            }
            Ok(Some(outcome)) => {
                debug!(room_id = %room_id, number = outcome.number, "Autodraw tick");
            }
            Err(AppError::Game(e)) => {
                info!(room_id = %room_id, reason = %e, "No more draws, autodraw ending");
                break;
            }
            Err(AppError::RoomNotFound(_)) => {
                warn!(room_id = %room_id, "Room disappeared, autodraw ending");
                return;
            }
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Autodraw tick failed, will retry");
            }
        }
    }

    // Usually already stored by the finishing draw; a no-op then
    let pause = AutoDrawChange {
        paused: true,
        interval_seconds: None,
    };
    if let Err(e) = room_service.set_autodraw(&room_id, pause).await {
        warn!(room_id = %room_id, error = %e, "Failed to mark autodraw paused");
    }
}
