//! Pure state machine for a single ask turn.
//!
//! [`Turn`] folds the stream events of one question into answer text and
//! pipeline progress. It performs no I/O; [`super::session::ChatSession`]
//! feeds it events and renders the effects it reports.

use time::OffsetDateTime;

use crate::types::{ChatStreamEvent, PipelineStep, StepState};

/// Notice folded into a partially-streamed answer when the turn fails.
pub const ERROR_NOTICE: &str = "Sorry, something went wrong while answering. Please ask again.";

/// Lifecycle of a single ask turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TurnPhase {
    /// The question was sent; no events have arrived yet.
    Submitted,

    /// Events are arriving.
    Streaming,

    /// The server confirmed the saved answer.
    Finalized,

    /// The turn failed mid-stream.
    Errored,

    /// The user interrupted the turn.
    Cancelled,
}

/// What the server reported when it finalized a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    /// The id the answer was saved under.
    pub message_id: i64,

    /// Server timestamp of the saved answer, or the local clock when the
    /// server omitted one.
    pub created_at: OffsetDateTime,
}

/// Observable effect of feeding one event to [`Turn::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A text fragment was appended to the answer.
    Token(String),

    /// A pipeline step visibly changed state.
    Step(PipelineStep, StepState),

    /// The turn completed.
    Finished(Finalized),

    /// The turn failed with the given detail; [`ERROR_NOTICE`] has been
    /// folded into the answer text.
    Failed(String),

    /// The event had no observable effect.
    Ignored,
}

/// Progress of the answer pipeline, as last reported by the server.
///
/// Progress is monotonic within a turn: a step that reached `Done` stays
/// there even if a stale `start` arrives afterwards. The whole indicator
/// disappears for good the moment the first answer token arrives.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    states: [StepState; PipelineStep::ALL.len()],
    visible: bool,
}

impl PipelineProgress {
    /// A fresh indicator: intent analysis underway, everything else pending.
    fn new() -> Self {
        let mut states = [StepState::Pending; PipelineStep::ALL.len()];
        states[step_index(PipelineStep::Intent)] = StepState::Running;
        PipelineProgress {
            states,
            visible: true,
        }
    }

    /// Current state of one step.
    pub fn state(&self, step: PipelineStep) -> StepState {
        self.states[step_index(step)]
    }

    /// Whether the indicator belongs on screen at all.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Steps in pipeline order with their current states.
    pub fn steps(&self) -> impl Iterator<Item = (PipelineStep, StepState)> + '_ {
        PipelineStep::ALL.into_iter().map(|step| (step, self.state(step)))
    }

    /// Advance a step, never backwards. Returns true if the state changed.
    fn advance(&mut self, step: PipelineStep, state: StepState) -> bool {
        let slot = &mut self.states[step_index(step)];
        if state > *slot {
            *slot = state;
            true
        } else {
            false
        }
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

fn step_index(step: PipelineStep) -> usize {
    match step {
        PipelineStep::Intent => 0,
        PipelineStep::Planner => 1,
        PipelineStep::Retriever => 2,
        PipelineStep::Executor => 3,
        PipelineStep::ExecutorMissing => 4,
    }
}

/// Folds one turn's stream events into answer text and pipeline progress.
///
/// Terminal phases are absorbing: once the turn is finalized, errored, or
/// cancelled, further events are ignored. Answer-writing steps that report
/// `done` before any token has arrived are held back, so the indicator
/// never claims the answer is written while its text area is still empty.
#[derive(Debug, Clone)]
pub struct Turn {
    phase: TurnPhase,
    pipeline: PipelineProgress,
    text: String,
    saw_token: bool,
    held_done: Vec<PipelineStep>,
}

impl Turn {
    /// Starts a turn in the [`TurnPhase::Submitted`] phase.
    pub fn new() -> Self {
        Turn {
            phase: TurnPhase::Submitted,
            pipeline: PipelineProgress::new(),
            text: String::new(),
            saw_token: false,
            held_done: Vec::new(),
        }
    }

    /// The turn's current phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The answer text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The pipeline progress indicator.
    pub fn pipeline(&self) -> &PipelineProgress {
        &self.pipeline
    }

    /// True once at least one answer token has arrived.
    pub fn saw_token(&self) -> bool {
        self.saw_token
    }

    /// True while the turn can still receive events.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, TurnPhase::Submitted | TurnPhase::Streaming)
    }

    /// Folds one event into the turn.
    pub fn apply(&mut self, event: ChatStreamEvent) -> Applied {
        if !self.is_active() {
            return Applied::Ignored;
        }
        self.phase = TurnPhase::Streaming;

        match event {
            ChatStreamEvent::Step(step_event) => {
                let Some(step) = step_event.pipeline_step() else {
                    // A step name this client does not know. Skip it
                    // rather than fail the whole turn.
                    return Applied::Ignored;
                };
                let state = step_event.status.display();
                if state == StepState::Done && step.is_generation() && !self.saw_token {
                    self.held_done.push(step);
                    return Applied::Ignored;
                }
                // The map stays truthful after the indicator is hidden,
                // but nothing surfaces.
                if self.pipeline.advance(step, state) && self.pipeline.is_visible() {
                    Applied::Step(step, state)
                } else {
                    Applied::Ignored
                }
            }
            ChatStreamEvent::Token(token_event) => {
                if !self.saw_token {
                    self.saw_token = true;
                    self.pipeline.hide();
                    for step in self.held_done.drain(..) {
                        self.pipeline.advance(step, StepState::Done);
                    }
                }
                self.text.push_str(&token_event.token);
                Applied::Token(token_event.token)
            }
            ChatStreamEvent::Done(done) => {
                self.phase = TurnPhase::Finalized;
                self.pipeline.hide();
                Applied::Finished(Finalized {
                    message_id: done.message_id,
                    created_at: done.created_at.unwrap_or_else(OffsetDateTime::now_utc),
                })
            }
            ChatStreamEvent::Error(error_event) => self.fail(error_event.message()),
        }
    }

    /// Fails the turn, keeping whatever text already streamed and folding
    /// [`ERROR_NOTICE`] in after it.
    ///
    /// Used for both server-sent error events and transport failures.
    pub fn fail(&mut self, detail: impl Into<String>) -> Applied {
        if !self.is_active() {
            return Applied::Ignored;
        }
        self.phase = TurnPhase::Errored;
        self.pipeline.hide();
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.text.push_str(ERROR_NOTICE);
        Applied::Failed(detail.into())
    }

    /// Cancels the turn. Text streamed so far is kept as-is. Returns false
    /// if the turn had already reached a terminal phase.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.phase = TurnPhase::Cancelled;
        self.pipeline.hide();
        true
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepStatus;

    #[test]
    fn fresh_turn_shows_intent_running() {
        let turn = Turn::new();
        assert_eq!(turn.phase(), TurnPhase::Submitted);
        assert!(turn.pipeline().is_visible());
        assert_eq!(turn.pipeline().state(PipelineStep::Intent), StepState::Running);
        for step in [
            PipelineStep::Planner,
            PipelineStep::Retriever,
            PipelineStep::Executor,
            PipelineStep::ExecutorMissing,
        ] {
            assert_eq!(turn.pipeline().state(step), StepState::Pending);
        }
    }

    #[test]
    fn tokens_accumulate_in_order() {
        let mut turn = Turn::new();
        assert_eq!(
            turn.apply(ChatStreamEvent::token("Try the ")),
            Applied::Token("Try the ".to_string())
        );
        assert_eq!(
            turn.apply(ChatStreamEvent::token("night market.")),
            Applied::Token("night market.".to_string())
        );
        assert_eq!(turn.text(), "Try the night market.");
        assert_eq!(turn.phase(), TurnPhase::Streaming);
    }

    #[test]
    fn steps_advance_and_never_move_backwards() {
        let mut turn = Turn::new();
        assert_eq!(
            turn.apply(ChatStreamEvent::step("planner", StepStatus::Start)),
            Applied::Step(PipelineStep::Planner, StepState::Running)
        );
        // A repeated start changes nothing.
        assert_eq!(
            turn.apply(ChatStreamEvent::step("planner", StepStatus::Start)),
            Applied::Ignored
        );
        assert_eq!(
            turn.apply(ChatStreamEvent::step("planner", StepStatus::Done)),
            Applied::Step(PipelineStep::Planner, StepState::Done)
        );
        // A stale start after done does not regress the step.
        assert_eq!(
            turn.apply(ChatStreamEvent::step("planner", StepStatus::Start)),
            Applied::Ignored
        );
        assert_eq!(turn.pipeline().state(PipelineStep::Planner), StepState::Done);
    }

    #[test]
    fn unknown_step_names_are_skipped() {
        let mut turn = Turn::new();
        assert_eq!(
            turn.apply(ChatStreamEvent::step("reranker", StepStatus::Start)),
            Applied::Ignored
        );
        assert_eq!(turn.phase(), TurnPhase::Streaming);
    }

    #[test]
    fn generation_done_is_held_until_the_first_token() {
        let mut turn = Turn::new();
        turn.apply(ChatStreamEvent::step("executor", StepStatus::Start));
        assert_eq!(
            turn.apply(ChatStreamEvent::step("executor", StepStatus::Done)),
            Applied::Ignored
        );
        // Still running: the answer area would otherwise sit empty under a
        // check mark.
        assert_eq!(turn.pipeline().state(PipelineStep::Executor), StepState::Running);
        assert!(turn.pipeline().is_visible());

        turn.apply(ChatStreamEvent::token("Gwangjang"));
        assert_eq!(turn.pipeline().state(PipelineStep::Executor), StepState::Done);
        assert!(!turn.pipeline().is_visible());
    }

    #[test]
    fn first_token_hides_the_indicator_for_good() {
        let mut turn = Turn::new();
        turn.apply(ChatStreamEvent::token("Sure"));
        assert!(!turn.pipeline().is_visible());

        // Later step reports still update the map but never resurface it.
        assert_eq!(
            turn.apply(ChatStreamEvent::step("retriever", StepStatus::Start)),
            Applied::Ignored
        );
        assert_eq!(turn.pipeline().state(PipelineStep::Retriever), StepState::Running);
        assert!(!turn.pipeline().is_visible());
    }

    #[test]
    fn done_finalizes_with_the_server_id() {
        let mut turn = Turn::new();
        turn.apply(ChatStreamEvent::token("Answer"));
        let applied = turn.apply(ChatStreamEvent::done(501));
        let Applied::Finished(finalized) = applied else {
            panic!("expected Finished, got {applied:?}");
        };
        assert_eq!(finalized.message_id, 501);
        assert_eq!(turn.phase(), TurnPhase::Finalized);

        // Terminal phases absorb everything after them.
        assert_eq!(turn.apply(ChatStreamEvent::token("extra")), Applied::Ignored);
        assert_eq!(turn.text(), "Answer");
    }

    #[test]
    fn error_keeps_partial_text_and_folds_in_the_notice() {
        let mut turn = Turn::new();
        turn.apply(ChatStreamEvent::token("Day 1: Bukchon"));
        let applied = turn.apply(ChatStreamEvent::error("llm backend unavailable"));
        assert_eq!(applied, Applied::Failed("llm backend unavailable".to_string()));
        assert_eq!(turn.phase(), TurnPhase::Errored);
        assert_eq!(turn.text(), format!("Day 1: Bukchon\n\n{ERROR_NOTICE}"));
    }

    #[test]
    fn error_before_any_token_is_just_the_notice() {
        let mut turn = Turn::new();
        turn.fail("connection reset");
        assert_eq!(turn.text(), ERROR_NOTICE);
        assert!(!turn.pipeline().is_visible());
    }

    #[test]
    fn cancel_stops_the_turn_and_keeps_the_text() {
        let mut turn = Turn::new();
        turn.apply(ChatStreamEvent::token("Partial"));
        assert!(turn.cancel());
        assert_eq!(turn.phase(), TurnPhase::Cancelled);
        assert_eq!(turn.text(), "Partial");
        assert_eq!(turn.apply(ChatStreamEvent::token("more")), Applied::Ignored);
        assert!(!turn.cancel());
    }
}
