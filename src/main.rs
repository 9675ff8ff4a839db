use bingo::room::repository::{InMemoryRoomRepository, RoomRepository};
use bingo::websockets::InMemoryConnectionManager;
use bingo::{build_router, AppState, ServerConfig};
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bingo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bingo server");

    let config = ServerConfig::from_env()?;

    let room_repository = match &config.snapshot_path {
        Some(path) => {
            info!(path = %path.display(), "Persisting rooms to snapshot file");
            Arc::new(InMemoryRoomRepository::with_snapshot_file(path)?)
        }
        None => {
            info!("No snapshot file configured, rooms live in memory only");
            Arc::new(InMemoryRoomRepository::new())
        }
    };

    let app_state = AppState::new(
        room_repository.clone(),
        config.draw_engine()?,
        Arc::new(InMemoryConnectionManager::new()),
        config.autodraw_interval_secs,
    );

    // Rooms restored from the snapshot need their event wiring and timers back
    let rooms = room_repository.list_rooms().await?;
    for room in &rooms {
        app_state.start_room_subscriptions(&room.id).await;
        app_state.autodraw.sync(room).await;
    }
    info!(restored = rooms.len(), "Restored rooms");

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(bind_addr = %config.bind_addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
