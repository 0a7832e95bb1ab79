use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ChatMessage;

/// A conversation with the planning assistant.
///
/// The room listing endpoint omits `messages`; the detail endpoint
/// includes the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    /// Server-assigned room id.
    pub id: i64,

    /// Owning user.
    pub user_id: i64,

    /// Room title shown in the room list.
    pub title: String,

    /// RFC 3339 creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Message history, oldest first.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_without_messages() {
        let json = serde_json::json!({
            "id": 9,
            "user_id": 2,
            "title": "Jeju weekend",
            "created_at": "2025-02-11T08:00:00Z"
        });
        let room: ChatRoom = serde_json::from_value(json).unwrap();
        assert_eq!(room.id, 9);
        assert_eq!(room.title, "Jeju weekend");
        assert!(room.messages.is_empty());
    }

    #[test]
    fn deserialization_with_history() {
        let json = serde_json::json!({
            "id": 9,
            "user_id": 2,
            "title": "Jeju weekend",
            "created_at": "2025-02-11T08:00:00Z",
            "messages": [
                {
                    "id": 1,
                    "room_id": 9,
                    "message": "Where should we stay?",
                    "role": "human",
                    "created_at": "2025-02-11T08:01:00Z"
                }
            ]
        });
        let room: ChatRoom = serde_json::from_value(json).unwrap();
        assert_eq!(room.messages.len(), 1);
        assert_eq!(room.messages[0].message, "Where should we stay?");
    }
}
