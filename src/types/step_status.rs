use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-step status as the server reports it.
///
/// `start` and `running` both mean the step is underway; older backends
/// emit `start`, newer ones `running`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step has begun.
    Start,

    /// The step is underway.
    Running,

    /// The step finished.
    Done,
}

impl StepStatus {
    /// Maps a wire status onto the state the progress indicator shows.
    pub fn display(&self) -> StepState {
        match self {
            StepStatus::Start | StepStatus::Running => StepState::Running,
            StepStatus::Done => StepState::Done,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Start => write!(f, "start"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Done => write!(f, "done"),
        }
    }
}

/// Displayed state of one pipeline step.
///
/// Ordered so that progress is monotonic: a step never moves backwards
/// within a turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Not reported yet; hidden from the indicator.
    Pending,

    /// Underway; shown with a spinner.
    Running,

    /// Finished; shown with a check.
    Done,
}

impl StepState {
    /// True once the step has been reported at all.
    pub fn is_visible(&self) -> bool {
        !matches!(self, StepState::Pending)
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Pending => write!(f, "pending"),
            StepState::Running => write!(f, "running"),
            StepState::Done => write!(f, "done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_start_displays_as_running() {
        assert_eq!(StepStatus::Start.display(), StepState::Running);
        assert_eq!(StepStatus::Running.display(), StepState::Running);
        assert_eq!(StepStatus::Done.display(), StepState::Done);
    }

    #[test]
    fn deserialization() {
        let status: StepStatus = serde_json::from_str(r#""start""#).unwrap();
        assert_eq!(status, StepStatus::Start);
    }

    #[test]
    fn state_ordering_is_monotonic() {
        assert!(StepState::Pending < StepState::Running);
        assert!(StepState::Running < StepState::Done);
    }

    #[test]
    fn visibility() {
        assert!(!StepState::Pending.is_visible());
        assert!(StepState::Running.is_visible());
        assert!(StepState::Done.is_visible());
    }
}
