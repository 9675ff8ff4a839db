use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{Player, RoomModel};
use crate::shared::AppError;

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Successfully joined the room, returns updated room data
    Success(RoomModel),
    /// Single-winner game is already decided
    GameAlreadyWon,
    /// Room does not exist
    RoomNotFound,
}

/// Result of a versioned room write
#[derive(Debug, Clone)]
pub enum UpdateRoomResult {
    /// Write applied, returns the stored room with its new version
    Success(RoomModel),
    /// Someone else wrote the room since it was read
    VersionConflict { current_version: u64 },
    /// Room does not exist
    RoomNotFound,
}

/// Trait for room repository operations
#[async_trait]
pub trait RoomRepository {
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError>;
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError>;

    /// Atomically appends a player to the room's player list
    async fn try_join_room(&self, room_id: &str, player: Player)
        -> Result<JoinRoomResult, AppError>;

    /// Replaces the stored room with `room` if the stored version still equals
    /// `room.version`. The stored copy gets `version + 1`.
    async fn try_update_room(&self, room: &RoomModel) -> Result<UpdateRoomResult, AppError>;
}

/// In-memory implementation of RoomRepository, optionally mirrored to a JSON file
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<String, RoomModel>>,
    snapshot_path: Option<PathBuf>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Creates a repository backed by a snapshot file.
    ///
    /// Rooms already in the file are loaded; a missing file starts empty.
    /// Every mutation rewrites the file before returning.
    pub fn with_snapshot_file(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let rooms = load_snapshot(&path)?;

        info!(
            path = %path.display(),
            room_count = rooms.len(),
            "Room snapshot loaded"
        );

        Ok(Self {
            rooms: Mutex::new(rooms),
            snapshot_path: Some(path),
        })
    }

    /// Stores `room` and saves the snapshot; the previous entry is restored if saving fails
    async fn commit(
        &self,
        rooms: &mut HashMap<String, RoomModel>,
        room: RoomModel,
    ) -> Result<(), AppError> {
        let room_id = room.id.clone();
        let previous = rooms.insert(room_id.clone(), room);

        if let Err(e) = self.save_snapshot(rooms).await {
            match previous {
                Some(previous) => rooms.insert(room_id, previous),
                None => rooms.remove(&room_id),
            };
            return Err(e);
        }

        Ok(())
    }

    /// Writes happen under the store lock, so snapshots land in mutation order
    async fn save_snapshot(&self, rooms: &HashMap<String, RoomModel>) -> Result<(), AppError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let mut snapshot: Vec<&RoomModel> = rooms.values().collect();
        snapshot.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| AppError::DatabaseError(format!("Failed to encode snapshot: {}", e)))?;

        // Write-then-rename so a crash never leaves a half-written file
        let tmp_path = path.with_extension("tmp");
        let written = match tokio::fs::write(&tmp_path, json).await {
            Ok(()) => tokio::fs::rename(&tmp_path, path).await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
                warn!(path = %path.display(), error = %e, "Failed to write room snapshot");
                AppError::DatabaseError(format!("Failed to write snapshot: {}", e))
            })?;

        debug!(path = %path.display(), room_count = rooms.len(), "Room snapshot saved");
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<HashMap<String, RoomModel>, AppError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let contents = fs::read(path)
        .map_err(|e| AppError::DatabaseError(format!("Failed to read snapshot: {}", e)))?;
    let rooms: Vec<RoomModel> = serde_json::from_slice(&contents)
        .map_err(|e| AppError::DatabaseError(format!("Invalid snapshot file: {}", e)))?;

    Ok(rooms.into_iter().map(|r| (r.id.clone(), r)).collect())
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        debug!(room_id = %room.id, room_name = %room.name, "Creating room in memory");

        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room.id) {
            warn!(room_id = %room.id, "Room already exists in memory");
            return Err(AppError::DatabaseError("Room already exists".to_string()));
        }
        self.commit(&mut rooms, room.clone()).await?;

        debug!(room_id = %room.id, "Room created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        debug!(room_id = %room_id, "Fetching room from memory");

        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).cloned();

        match &room {
            Some(r) => debug!(room_id = %room_id, version = r.version, "Room found in memory"),
            None => debug!(room_id = %room_id, "Room not found in memory"),
        }

        Ok(room)
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        debug!("Listing all rooms in memory");

        let rooms = self.rooms.lock().await;
        let mut room_list: Vec<RoomModel> = rooms.values().cloned().collect();
        room_list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        debug!(room_count = room_list.len(), "Rooms listed successfully in memory");
        Ok(room_list)
    }

    #[instrument(skip(self, player), fields(player_id = %player.id))]
    async fn try_join_room(
        &self,
        room_id: &str,
        player: Player,
    ) -> Result<JoinRoomResult, AppError> {
        debug!(room_id = %room_id, player_name = %player.name, "Attempting to join room atomically");

        let mut rooms = self.rooms.lock().await;

        let Some(room) = rooms.get(room_id) else {
            debug!(room_id = %room_id, "Room not found");
            return Ok(JoinRoomResult::RoomNotFound);
        };

        if room.winners.is_finalized() {
            debug!(room_id = %room_id, "Game already won, join rejected");
            return Ok(JoinRoomResult::GameAlreadyWon);
        }

        if room.has_player(&player.id) {
            debug!(room_id = %room_id, player_id = %player.id, "Player already in room");
            return Ok(JoinRoomResult::Success(room.clone()));
        }

        let mut updated_room = room.clone();
        updated_room.add_player(player);
        updated_room.version += 1;
        self.commit(&mut rooms, updated_room.clone()).await?;

        info!(
            room_id = %room_id,
            new_player_count = updated_room.get_player_count(),
            "Player joined room successfully (atomic)"
        );

        Ok(JoinRoomResult::Success(updated_room))
    }

    #[instrument(skip(self, room), fields(room_id = %room.id, expected_version = room.version))]
    async fn try_update_room(&self, room: &RoomModel) -> Result<UpdateRoomResult, AppError> {
        let mut rooms = self.rooms.lock().await;

        let Some(current) = rooms.get(&room.id) else {
            debug!(room_id = %room.id, "Room not found");
            return Ok(UpdateRoomResult::RoomNotFound);
        };

        if current.version != room.version {
            debug!(
                room_id = %room.id,
                current_version = current.version,
                "Version conflict, update rejected"
            );
            return Ok(UpdateRoomResult::VersionConflict {
                current_version: current.version,
            });
        }

        let mut updated_room = room.clone();
        updated_room.version += 1;
        self.commit(&mut rooms, updated_room.clone()).await?;

        debug!(
            room_id = %room.id,
            version = updated_room.version,
            "Room updated in memory"
        );

        Ok(UpdateRoomResult::Success(updated_room))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{RoomRules, WinnerMode};
    use crate::room::models::Winners;
    use std::sync::Arc;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub fn create_test_room(room_id: &str) -> RoomModel {
            let mut room = RoomModel::new(format!("{} name", room_id), RoomRules::default());
            room.id = room_id.to_string();
            room
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_create_and_get_room() {
        let repo = InMemoryRoomRepository::new();
        let room = create_test_room("test-room");

        repo.create_room(&room).await.unwrap();

        let retrieved = repo.get_room(&room.id).await.unwrap();
        assert_eq!(retrieved, Some(room));
    }

    #[tokio::test]
    async fn test_get_nonexistent_room() {
        let repo = InMemoryRoomRepository::new();

        let result = repo.get_room("nonexistent-room").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_room() {
        let repo = InMemoryRoomRepository::new();
        let room = create_test_room("test-room");

        repo.create_room(&room).await.unwrap();

        let result = repo.create_room(&room).await;
        assert!(matches!(result.unwrap_err(), AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_list_rooms() {
        let repo = InMemoryRoomRepository::new();
        repo.create_room(&create_test_room("room-a")).await.unwrap();
        repo.create_room(&create_test_room("room-b")).await.unwrap();

        let rooms = repo.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert!(rooms.iter().any(|r| r.id == "room-a"));
        assert!(rooms.iter().any(|r| r.id == "room-b"));
    }

    #[tokio::test]
    async fn test_join_room_appends_player_and_bumps_version() {
        let repo = InMemoryRoomRepository::new();
        repo.create_room(&create_test_room("test-room")).await.unwrap();

        let alice = Player::new("alice".to_string());
        let bob = Player::new("bob".to_string());

        repo.try_join_room("test-room", alice.clone()).await.unwrap();
        let result = repo.try_join_room("test-room", bob.clone()).await.unwrap();

        match result {
            JoinRoomResult::Success(room) => {
                assert_eq!(room.players, vec![alice, bob]);
                assert_eq!(room.version, 2);
            }
            other => panic!("Expected Success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_nonexistent_room() {
        let repo = InMemoryRoomRepository::new();

        let result = repo
            .try_join_room("nope", Player::new("alice".to_string()))
            .await
            .unwrap();
        assert!(matches!(result, JoinRoomResult::RoomNotFound));
    }

    #[tokio::test]
    async fn test_join_rejected_after_single_winner() {
        let repo = InMemoryRoomRepository::new();
        let mut room = create_test_room("won-room");
        room.winners = Winners::Single {
            winner: Some("someone".to_string()),
        };
        repo.create_room(&room).await.unwrap();

        let result = repo
            .try_join_room("won-room", Player::new("late".to_string()))
            .await
            .unwrap();
        assert!(matches!(result, JoinRoomResult::GameAlreadyWon));
    }

    #[tokio::test]
    async fn test_join_allowed_after_ranked_winner() {
        let repo = InMemoryRoomRepository::new();
        let mut room = RoomModel::new(
            "ranked".to_string(),
            RoomRules {
                winner_mode: WinnerMode::Ranked,
                ..RoomRules::default()
            },
        );
        room.winners = Winners::Ranked {
            winners: vec!["someone".to_string()],
        };
        repo.create_room(&room).await.unwrap();

        let result = repo
            .try_join_room(&room.id, Player::new("late".to_string()))
            .await
            .unwrap();
        assert!(matches!(result, JoinRoomResult::Success(_)));
    }

    #[tokio::test]
    async fn test_update_room_with_current_version() {
        let repo = InMemoryRoomRepository::new();
        let room = create_test_room("test-room");
        repo.create_room(&room).await.unwrap();

        let mut next = room.clone();
        next.draw.drawn_numbers.push(7);

        let result = repo.try_update_room(&next).await.unwrap();
        let UpdateRoomResult::Success(stored) = result else {
            panic!("Expected Success");
        };
        assert_eq!(stored.version, 1);
        assert_eq!(stored.draw.drawn_numbers, vec![7]);

        let fetched = repo.get_room("test-room").await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn test_update_room_rejects_stale_version() {
        let repo = InMemoryRoomRepository::new();
        let room = create_test_room("test-room");
        repo.create_room(&room).await.unwrap();

        let mut first = room.clone();
        first.draw.drawn_numbers.push(1);
        let mut second = room.clone();
        second.draw.drawn_numbers.push(2);

        assert!(matches!(
            repo.try_update_room(&first).await.unwrap(),
            UpdateRoomResult::Success(_)
        ));
        assert!(matches!(
            repo.try_update_room(&second).await.unwrap(),
            UpdateRoomResult::VersionConflict { current_version: 1 }
        ));

        let stored = repo.get_room("test-room").await.unwrap().unwrap();
        assert_eq!(stored.draw.drawn_numbers, vec![1]);
    }

    #[tokio::test]
    async fn test_update_missing_room() {
        let repo = InMemoryRoomRepository::new();
        let result = repo
            .try_update_room(&create_test_room("ghost"))
            .await
            .unwrap();
        assert!(matches!(result, UpdateRoomResult::RoomNotFound));
    }

    #[tokio::test]
    async fn test_snapshot_file_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rooms.json");

        let room = create_test_room("persisted");
        let player = Player::new("alice".to_string());
        {
            let repo = InMemoryRoomRepository::with_snapshot_file(&path).unwrap();
            repo.create_room(&room).await.unwrap();
            repo.try_join_room("persisted", player.clone())
                .await
                .unwrap();
        }

        let reloaded = InMemoryRoomRepository::with_snapshot_file(&path).unwrap();
        let stored = reloaded.get_room("persisted").await.unwrap().unwrap();
        assert_eq!(stored.players, vec![player]);
        assert_eq!(stored.version, 1);
        assert_eq!(stored.name, room.name);
        assert_eq!(stored.created_at, room.created_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_leave_latest_state_in_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rooms.json");
        let repo = Arc::new(InMemoryRoomRepository::with_snapshot_file(&path).unwrap());
        for i in 0..4 {
            repo.create_room(&create_test_room(&format!("room-{}", i)))
                .await
                .unwrap();
        }

        // One writer per room, each applying a run of versioned updates
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    let room_id = format!("room-{}", i);
                    for n in 1..=10u8 {
                        let mut next = repo.get_room(&room_id).await.unwrap().unwrap();
                        next.draw.drawn_numbers.push(n);
                        let result = repo.try_update_room(&next).await.unwrap();
                        assert!(matches!(result, UpdateRoomResult::Success(_)));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let reloaded = InMemoryRoomRepository::with_snapshot_file(&path).unwrap();
        for i in 0..4 {
            let room_id = format!("room-{}", i);
            let in_memory = repo.get_room(&room_id).await.unwrap().unwrap();
            let on_disk = reloaded.get_room(&room_id).await.unwrap().unwrap();
            assert_eq!(on_disk, in_memory);
            assert_eq!(on_disk.version, 10);
        }
    }

    #[tokio::test]
    async fn test_missing_snapshot_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo =
            InMemoryRoomRepository::with_snapshot_file(dir.path().join("absent.json")).unwrap();

        assert!(repo.list_rooms().await.unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rooms.json");
        fs::write(&path, b"{not json").unwrap();

        let result = InMemoryRoomRepository::with_snapshot_file(&path);
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so every save fails
        let path = dir.path().join("missing-dir").join("rooms.json");
        let repo = InMemoryRoomRepository::with_snapshot_file(&path).unwrap();

        let result = repo.create_room(&create_test_room("r")).await;

        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert!(repo.get_room("r").await.unwrap().is_none());
    }
}
