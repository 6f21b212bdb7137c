//! Message protocol definitions
//!
//! JSON event envelope `{"event": <name>, "data": <value>}` using Serde's
//! adjacently tagged enums. Chat payloads are opaque and relayed unchanged.

use serde::{Deserialize, Serialize};

/// Opaque chat payload
///
/// Any JSON value a client sends. The relay never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatMessage(pub serde_json::Value);

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<serde_json::Value> for ChatMessage {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Client → Server event
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Chat message to broadcast to everyone
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessage),
}

/// Server → Client event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection accepted, connection ID issued
    Connected { id: String },
    /// Chat message relayed from some client
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_deserialize_string() {
        let json = r#"{"event": "chat message", "data": "hello"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::ChatMessage(msg) => assert_eq!(msg, ChatMessage(json!("hello"))),
        }
    }

    #[test]
    fn test_client_event_deserialize_object_payload() {
        let json = r#"{"event": "chat message", "data": {"nick": "X", "text": [1, 2.5, null]}}"#;
        let ClientEvent::ChatMessage(msg) = serde_json::from_str::<ClientEvent>(json).unwrap();
        assert_eq!(msg.0, json!({"nick": "X", "text": [1, 2.5, null]}));
    }

    #[test]
    fn test_client_event_unknown_event() {
        let json = r#"{"event": "typing", "data": null}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn test_server_event_connected_serialize() {
        let event = ServerEvent::Connected {
            id: "test-id".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"event": "connected", "data": {"id": "test-id"}}));
    }

    #[test]
    fn test_server_event_chat_keeps_payload() {
        let payload = json!({"body": "hi", "n": 3});
        let event = ServerEvent::ChatMessage(ChatMessage(payload.clone()));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "chat message");
        assert_eq!(value["data"], payload);
    }
}
