use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{PipelineStep, StepStatus};

/// A pipeline progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Step name as the server spells it.
    pub step: String,

    /// Reported status.
    pub status: StepStatus,
}

impl StepEvent {
    /// The step, if this client recognizes the name. Unknown steps are
    /// skipped by the consumer so new server stages do not break old
    /// clients.
    pub fn pipeline_step(&self) -> Option<PipelineStep> {
        self.step.parse().ok()
    }
}

/// A fragment of the streamed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEvent {
    /// The text fragment, applied strictly in receipt order.
    pub token: String,
}

/// Terminal completion notice for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoneEvent {
    /// Always true.
    pub done: bool,

    /// Server-assigned id for the assistant message.
    pub message_id: i64,

    /// Server-side creation time; older backends omit it.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

/// Terminal failure notice for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Whatever the server chose to send; usually a bare string.
    pub error: serde_json::Value,
}

impl ErrorEvent {
    /// The failure rendered as a displayable string.
    pub fn message(&self) -> String {
        match &self.error {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One frame of the answer stream.
///
/// Frames are distinguished by which key is present, so the union is
/// untagged; the payload shapes are disjoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatStreamEvent {
    /// `{"step": ..., "status": ...}`
    Step(StepEvent),

    /// `{"token": ...}`
    Token(TokenEvent),

    /// `{"done": true, "message_id": ...}`
    Done(DoneEvent),

    /// `{"error": ...}`
    Error(ErrorEvent),
}

impl ChatStreamEvent {
    /// Creates a step event.
    pub fn step(step: impl Into<String>, status: StepStatus) -> Self {
        ChatStreamEvent::Step(StepEvent {
            step: step.into(),
            status,
        })
    }

    /// Creates a token event.
    pub fn token(token: impl Into<String>) -> Self {
        ChatStreamEvent::Token(TokenEvent {
            token: token.into(),
        })
    }

    /// Creates a completion event.
    pub fn done(message_id: i64) -> Self {
        ChatStreamEvent::Done(DoneEvent {
            done: true,
            message_id,
            created_at: None,
        })
    }

    /// Creates a failure event.
    pub fn error(message: impl Into<String>) -> Self {
        ChatStreamEvent::Error(ErrorEvent {
            error: serde_json::Value::String(message.into()),
        })
    }

    /// True if this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatStreamEvent::Done(_) | ChatStreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn step_frame_deserialization() {
        let json = r#"{"step": "intent", "status": "start"}"#;
        let event: ChatStreamEvent = serde_json::from_str(json).unwrap();
        match event {
            ChatStreamEvent::Step(step) => {
                assert_eq!(step.pipeline_step(), Some(PipelineStep::Intent));
                assert_eq!(step.status, StepStatus::Start);
            }
            other => panic!("expected step event, got {other:?}"),
        }
    }

    #[test]
    fn unknown_step_name_is_preserved() {
        let json = r#"{"step": "reranker", "status": "done"}"#;
        let event: ChatStreamEvent = serde_json::from_str(json).unwrap();
        match event {
            ChatStreamEvent::Step(step) => {
                assert_eq!(step.step, "reranker");
                assert_eq!(step.pipeline_step(), None);
            }
            other => panic!("expected step event, got {other:?}"),
        }
    }

    #[test]
    fn token_frame_deserialization() {
        let json = r#"{"token": "Gwangjang "}"#;
        let event: ChatStreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, ChatStreamEvent::token("Gwangjang "));
    }

    #[test]
    fn done_frame_deserialization() {
        let json = r#"{"done": true, "message_id": 501}"#;
        let event: ChatStreamEvent = serde_json::from_str(json).unwrap();
        match event {
            ChatStreamEvent::Done(done) => {
                assert!(done.done);
                assert_eq!(done.message_id, 501);
                assert_eq!(done.created_at, None);
            }
            other => panic!("expected done event, got {other:?}"),
        }
    }

    #[test]
    fn done_frame_with_timestamp() {
        let json = r#"{"done": true, "message_id": 501, "created_at": "2025-03-01T09:30:00Z"}"#;
        let event: ChatStreamEvent = serde_json::from_str(json).unwrap();
        match event {
            ChatStreamEvent::Done(done) => {
                assert_eq!(done.created_at, Some(datetime!(2025-03-01 09:30:00 UTC)));
            }
            other => panic!("expected done event, got {other:?}"),
        }
    }

    #[test]
    fn error_frame_deserialization() {
        let json = r#"{"error": "llm backend unavailable"}"#;
        let event: ChatStreamEvent = serde_json::from_str(json).unwrap();
        match &event {
            ChatStreamEvent::Error(err) => {
                assert_eq!(err.message(), "llm backend unavailable");
            }
            other => panic!("expected error event, got {other:?}"),
        }
        assert!(event.is_terminal());
    }

    #[test]
    fn terminal_classification() {
        assert!(ChatStreamEvent::done(1).is_terminal());
        assert!(ChatStreamEvent::error("x").is_terminal());
        assert!(!ChatStreamEvent::token("x").is_terminal());
        assert!(!ChatStreamEvent::step("intent", StepStatus::Start).is_terminal());
    }
}
