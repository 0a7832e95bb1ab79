use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author of a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The person planning the trip.
    Human,

    /// The planning assistant.
    Ai,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::Human => write!(f, "human"),
            MessageRole::Ai => write!(f, "ai"),
        }
    }
}

/// Error returned when parsing an invalid role string.
#[derive(Debug)]
pub struct MessageRoleParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for MessageRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown message role: {}", self.invalid_value)
    }
}

impl std::error::Error for MessageRoleParseError {}

impl FromStr for MessageRole {
    type Err = MessageRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(MessageRole::Human),
            "ai" => Ok(MessageRole::Ai),
            _ => Err(MessageRoleParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization() {
        let json = serde_json::to_string(&MessageRole::Human).unwrap();
        assert_eq!(json, r#""human""#);

        let json = serde_json::to_string(&MessageRole::Ai).unwrap();
        assert_eq!(json, r#""ai""#);
    }

    #[test]
    fn deserialization() {
        let role: MessageRole = serde_json::from_str(r#""ai""#).unwrap();
        assert_eq!(role, MessageRole::Ai);
    }

    #[test]
    fn display() {
        assert_eq!(MessageRole::Human.to_string(), "human");
        assert_eq!(MessageRole::Ai.to_string(), "ai");
    }
}
