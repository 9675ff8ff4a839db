use std::sync::Arc;

use bingo::{
    game::{DrawEngine, RoomRules, WinRule, WinnerMode},
    room::{
        models::{Player, RoomModel, DEFAULT_DRAW_INTERVAL_SECS},
        repository::InMemoryRoomRepository,
        types::RoomCreateRequest,
    },
    websockets::{ConnectionManager, WebsocketReceiveHandler},
    AppState,
};
use tokio::sync::mpsc;

use super::mocks::{MockConnectionManager, ScriptedSuggestion};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app_state: AppState,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub input_handler: WebsocketReceiveHandler,
    /// Answers queued here become the next drawn numbers
    pub suggestions: Arc<ScriptedSuggestion>,
    pub room_id: String,
    pub connections: Vec<String>,
    pub players: Vec<Player>,
}

pub struct TestSetupBuilder {
    player_names: Vec<String>,
    connection_count: usize,
    rules: RoomRules,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            player_names: vec![],
            connection_count: 2,
            rules: RoomRules::default(),
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.player_names = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_connections(mut self, count: usize) -> Self {
        self.connection_count = count;
        self
    }

    pub fn with_rules(mut self, win_rule: WinRule, winner_mode: WinnerMode) -> Self {
        self.rules = RoomRules {
            win_rule,
            winner_mode,
        };
        self
    }

    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let suggestions = ScriptedSuggestion::new();

        let app_state = AppState::new(
            Arc::new(InMemoryRoomRepository::new()),
            DrawEngine::with_suggestion_source(suggestions.clone()),
            mock_conn_manager.clone(),
            DEFAULT_DRAW_INTERVAL_SECS,
        );

        let room: RoomModel = app_state
            .room_service
            .create_room(RoomCreateRequest {
                name: "test room".to_string(),
                win_rule: Some(self.rules.win_rule),
                winner_mode: Some(self.rules.winner_mode),
            })
            .await
            .unwrap();
        app_state.start_room_subscriptions(&room.id).await;

        // Join before anyone watches so watchers start with empty queues
        let mut players = vec![];
        for name in &self.player_names {
            players.push(app_state.room_service.join_room(&room.id, name).await.unwrap());
        }

        let mut connections = vec![];
        for i in 0..self.connection_count {
            let connection_id = format!("conn-{}", i + 1);
            let (sender, _) = mpsc::unbounded_channel();
            mock_conn_manager
                .add_connection(&room.id, connection_id.clone(), sender)
                .await;
            connections.push(connection_id);
        }

        let input_handler = WebsocketReceiveHandler::new(
            app_state.event_bus.clone(),
            mock_conn_manager.clone(),
        );

        TestSetup {
            app_state,
            mock_conn_manager,
            input_handler,
            suggestions,
            room_id: room.id,
            connections,
            players,
        }
    }
}

impl TestSetup {
    pub fn player(&self, name: &str) -> &Player {
        self.players
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("no player named {}", name))
    }

    pub async fn room(&self) -> RoomModel {
        self.app_state
            .room_service
            .get_room_details(&self.room_id)
            .await
            .unwrap()
    }
}
