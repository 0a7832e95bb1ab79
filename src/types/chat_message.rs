use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{MessageId, MessageRole};

/// One message in a chat room.
///
/// Messages the client appends optimistically carry a local id and the
/// local clock until the server confirms them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identity; local until the turn completes.
    pub id: MessageId,

    /// Room this message belongs to.
    pub room_id: i64,

    /// Message text.
    pub message: String,

    /// Author of the message.
    pub role: MessageRole,

    /// RFC 3339 creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Latitude attached to location-aware asks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude attached to location-aware asks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Attached image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    /// Whether this message is bookmarked.
    #[serde(default)]
    pub bookmark_yn: bool,
}

impl ChatMessage {
    /// Creates a locally-authored message stamped with the local clock.
    pub fn local(room_id: i64, role: MessageRole, message: impl Into<String>) -> Self {
        ChatMessage {
            id: MessageId::fresh_local(),
            room_id,
            message: message.into(),
            role,
            created_at: OffsetDateTime::now_utc(),
            latitude: None,
            longitude: None,
            image_path: None,
            bookmark_yn: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn deserialization() {
        let json = serde_json::json!({
            "id": 17,
            "room_id": 3,
            "message": "Day two: Bukchon in the morning.",
            "role": "ai",
            "created_at": "2025-03-01T09:30:00Z",
            "bookmark_yn": true
        });
        let message: ChatMessage = serde_json::from_value(json).unwrap();

        assert_eq!(message.id, MessageId::Remote(17));
        assert_eq!(message.room_id, 3);
        assert_eq!(message.role, MessageRole::Ai);
        assert_eq!(message.created_at, datetime!(2025-03-01 09:30:00 UTC));
        assert!(message.bookmark_yn);
        assert_eq!(message.latitude, None);
    }

    #[test]
    fn local_messages_start_unconfirmed() {
        let message = ChatMessage::local(1, MessageRole::Human, "3 days in Seoul");
        assert!(message.id.is_local());
        assert!(!message.bookmark_yn);
        assert_eq!(message.room_id, 1);
    }
}
