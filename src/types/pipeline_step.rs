use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stages of the answer pipeline, in the order the server runs them.
///
/// The server names steps on the wire; names this client does not
/// recognize are skipped by the consumer rather than failing the turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Classifying what the user is asking for.
    Intent,

    /// Drafting the trip plan.
    Planner,

    /// Searching places to fill the plan.
    Retriever,

    /// Writing the answer.
    Executor,

    /// Filling in details the plan was missing.
    ExecutorMissing,
}

impl PipelineStep {
    /// All steps, in display order.
    pub const ALL: [PipelineStep; 5] = [
        PipelineStep::Intent,
        PipelineStep::Planner,
        PipelineStep::Retriever,
        PipelineStep::Executor,
        PipelineStep::ExecutorMissing,
    ];

    /// True for the steps that stream the answer text. Their completion
    /// notices are held back until the first token is visible.
    pub fn is_generation(&self) -> bool {
        matches!(self, PipelineStep::Executor | PipelineStep::ExecutorMissing)
    }

    /// Short human-readable label for progress display.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStep::Intent => "Analyzing intent",
            PipelineStep::Planner => "Drafting the trip plan",
            PipelineStep::Retriever => "Searching places",
            PipelineStep::Executor => "Writing the answer",
            PipelineStep::ExecutorMissing => "Checking missing details",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Intent => write!(f, "intent"),
            PipelineStep::Planner => write!(f, "planner"),
            PipelineStep::Retriever => write!(f, "retriever"),
            PipelineStep::Executor => write!(f, "executor"),
            PipelineStep::ExecutorMissing => write!(f, "executor_missing"),
        }
    }
}

/// Error returned when parsing an unrecognized step name.
#[derive(Debug)]
pub struct PipelineStepParseError {
    /// The step name that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for PipelineStepParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown pipeline step: {}", self.invalid_value)
    }
}

impl std::error::Error for PipelineStepParseError {}

impl FromStr for PipelineStep {
    type Err = PipelineStepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intent" => Ok(PipelineStep::Intent),
            "planner" => Ok(PipelineStep::Planner),
            "retriever" => Ok(PipelineStep::Retriever),
            "executor" => Ok(PipelineStep::Executor),
            "executor_missing" => Ok(PipelineStep::ExecutorMissing),
            _ => Err(PipelineStepParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}
