use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, RwLock};

use bingo::suggestion::{SuggestionError, SuggestionRequest, SuggestionSource};
use bingo::websockets::ConnectionManager;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records outbound messages per connection instead of writing to sockets
#[derive(Clone)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    /// connection id -> room id
    connections: Arc<RwLock<HashMap<String, String>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get_messages_for(&self, connection_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(connection_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pops the oldest message sent to `connection_id`
    pub async fn consume_message_for(&self, connection_id: &str) -> Option<String> {
        self.sent_messages
            .write()
            .await
            .get_mut(connection_id)
            .and_then(|queue| queue.pop_front())
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(
        &self,
        room_id: &str,
        connection_id: String,
        _sender: mpsc::UnboundedSender<String>,
    ) {
        self.connections
            .write()
            .await
            .insert(connection_id, room_id.to_string());
    }

    async fn remove_connection(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(connection_id.to_string())
            .or_default()
            .push_back(message.to_string());
    }

    async fn send_to_room(&self, room_id: &str, message: &str) {
        let targets: Vec<String> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(_, room)| room.as_str() == room_id)
            .map(|(connection_id, _)| connection_id.clone())
            .collect();

        for connection_id in targets {
            self.send_to_connection(&connection_id, message).await;
        }
    }
}

/// Suggestion source that answers from a queue, then fails once it runs dry
#[derive(Default)]
pub struct ScriptedSuggestion {
    answers: Mutex<VecDeque<i64>>,
}

impl ScriptedSuggestion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, answer: i64) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSuggestion {
    async fn suggest(&self, _request: &SuggestionRequest) -> Result<i64, SuggestionError> {
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(|| SuggestionError::Unavailable("script exhausted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
