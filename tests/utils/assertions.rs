//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json;

use bingo::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every connection watching the room
    pub fn for_all_connections(setup: &'a TestSetup) -> Self {
        let connections = setup.connections.iter().map(|s| s.as_str()).collect();
        Self { setup, connections }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    /// Assert that connections received a specific message type (consumes the message from queue)
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            assert!(
                message.is_some(),
                "{} should have received a message",
                connection
            );

            let msg: WebSocketMessage = serde_json::from_str(&message.unwrap()).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection
            );
            messages.push(msg);
        }

        // Broadcasts carry the same payload to every watcher
        for (i, msg) in messages.iter().enumerate().skip(1) {
            assert_eq!(
                msg.payload, messages[0].payload,
                "Connection {} payload differs from connection {}",
                self.connections[i], self.connections[0]
            );
        }

        MessageContent {
            payload: messages[0].payload.clone(),
        }
    }

    /// Assert that connections received no messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }

    /// Count how many messages of a specific type a connection received (non-consuming)
    pub async fn count_message_type(&self, connection: &str, msg_type: MessageType) -> usize {
        let messages = self
            .setup
            .mock_conn_manager
            .get_messages_for(connection)
            .await;
        messages
            .iter()
            .filter_map(|msg_str| serde_json::from_str::<WebSocketMessage>(msg_str).ok())
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    pub payload: serde_json::Value,
}

impl MessageContent {
    /// Assert a NUMBER_DRAWN message carries `expected`
    pub fn with_number(self, expected: u8) -> Self {
        assert_eq!(self.payload["number"], expected);
        self
    }

    /// Assert a WINNERS message names these players as winning on this draw
    pub fn with_new_winners(self, expected: Vec<&str>) -> Self {
        let actual: Vec<String> =
            serde_json::from_value(self.payload["newWinners"].clone()).unwrap();
        assert_eq!(actual, expected);
        self
    }

    /// Assert the full winner list, in rank order
    pub fn with_winners(self, expected: Vec<&str>) -> Self {
        let actual: Vec<String> = serde_json::from_value(self.payload["winners"].clone()).unwrap();
        assert_eq!(actual, expected);
        self
    }

    pub fn with_paused(self, expected: bool) -> Self {
        assert_eq!(self.payload["isPaused"], expected);
        self
    }

    /// Assert the embedded room snapshot has drawn exactly `count` numbers
    pub fn with_drawn_count(self, count: usize) -> Self {
        let drawn = self.payload["room"]["draw"]["drawnNumbers"]
            .as_array()
            .expect("payload should embed the room");
        assert_eq!(drawn.len(), count);
        self
    }

    pub fn with_reason_containing(self, fragment: &str) -> Self {
        let reason = self.payload["reason"].as_str().unwrap_or_default();
        assert!(
            reason.contains(fragment),
            "reason {:?} should mention {:?}",
            reason,
            fragment
        );
        self
    }
}
