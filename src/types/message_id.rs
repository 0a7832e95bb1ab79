use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LOCAL: AtomicU64 = AtomicU64::new(1);

/// Identity of a chat message.
///
/// A message appended optimistically on send carries a `Local` id until the
/// server confirms the turn, at which point it is reconciled to the
/// server-assigned `Remote` id. Keeping the two spaces in one tagged type
/// makes reconciliation a typed transition instead of a sentinel value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Client-assigned placeholder id; never seen by the server.
    Local(u64),

    /// Server-assigned id.
    Remote(i64),
}

impl MessageId {
    /// Mints a fresh local id, unique within this process.
    pub fn fresh_local() -> Self {
        MessageId::Local(NEXT_LOCAL.fetch_add(1, Ordering::Relaxed))
    }

    /// True if this id is still a client-side placeholder.
    pub fn is_local(&self) -> bool {
        matches!(self, MessageId::Local(_))
    }

    /// True if the server has confirmed this message.
    pub fn is_remote(&self) -> bool {
        matches!(self, MessageId::Remote(_))
    }

    /// The server-assigned id, if confirmed.
    pub fn remote(&self) -> Option<i64> {
        match self {
            MessageId::Remote(id) => Some(*id),
            MessageId::Local(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Local(id) => write!(f, "local-{id}"),
            MessageId::Remote(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId::Remote(id)
    }
}

// The wire carries bare numeric ids; only remote ids ever round-trip.
// Serializing a local id emits its temporary number, which only matters
// for transcripts dumped mid-turn.
impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MessageId::Local(id) => serializer.serialize_u64(*id),
            MessageId::Remote(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = i64::deserialize(deserializer)?;
        Ok(MessageId::Remote(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_local_ids_are_distinct() {
        let a = MessageId::fresh_local();
        let b = MessageId::fresh_local();
        assert!(a.is_local());
        assert_ne!(a, b);
    }

    #[test]
    fn deserialization_is_remote() {
        let id: MessageId = serde_json::from_str("501").unwrap();
        assert_eq!(id, MessageId::Remote(501));
        assert_eq!(id.remote(), Some(501));
    }

    #[test]
    fn remote_serializes_as_number() {
        let json = serde_json::to_string(&MessageId::Remote(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn display() {
        assert_eq!(MessageId::Remote(7).to_string(), "7");
        assert_eq!(MessageId::Local(3).to_string(), "local-3");
    }
}
