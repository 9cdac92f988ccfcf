use exam_core::model::{
    AnswerValue, ModuleKind, QuestionId, ResultId, TaskNumber, TestId, TestMode, WritingTask,
};
use services::attempts::{
    AttemptLoopService, AttemptPhase, AttemptProgress, PlaybackGate, Position, QuestionStatus,
    SessionEngine, SubmitOutcome, SubmitTrigger, TickEvent, TransportCommand,
};

use crate::views::ViewError;

/// What a user interaction asks the attempt to do.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptIntent {
    Answer(QuestionId, AnswerValue),
    Next,
    Previous,
    Jump { section: usize, question: usize },
    ToggleAudio,
}

/// Where the attempt stands after an async step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Continue,
    Completed { result_id: ResultId },
}

/// View-model wrapping one attempt's engine for the test-taking view.
///
/// All methods are synchronous pass-throughs except [`AttemptVm::submit`],
/// which drives the workflow service and owns the error translation.
pub struct AttemptVm {
    engine: SessionEngine,
}

impl AttemptVm {
    #[must_use]
    pub fn new(engine: SessionEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.engine.definition().title()
    }

    #[must_use]
    pub fn module(&self) -> ModuleKind {
        self.engine.module()
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.engine.mode()
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.engine.definition().id()
    }

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.engine.phase()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.engine.phase() == AttemptPhase::Submitting
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.engine.position()
    }

    #[must_use]
    pub fn at_final_question(&self) -> bool {
        self.engine.at_final_question()
    }

    #[must_use]
    pub fn at_first_question(&self) -> bool {
        self.engine.at_first_question()
    }

    /// Remaining seconds on the budget the header clock shows: the active
    /// task's budget for Writing, the whole budget otherwise.
    #[must_use]
    pub fn display_remaining(&self) -> u32 {
        self.engine.active_remaining_seconds()
    }

    /// Final five minutes of the displayed budget; the header turns red.
    #[must_use]
    pub fn low_time(&self) -> bool {
        self.display_remaining() <= 300
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        self.engine.progress()
    }

    #[must_use]
    pub fn question_statuses(&self) -> Vec<QuestionStatus> {
        self.engine.question_statuses()
    }

    #[must_use]
    pub fn answer_text(&self, question: QuestionId) -> String {
        match self.engine.answer(question) {
            Some(AnswerValue::Text(s) | AnswerValue::Choice(s)) => s.clone(),
            Some(AnswerValue::Choices(items)) => items.join(", "),
            None => String::new(),
        }
    }

    #[must_use]
    pub fn is_choice_selected(&self, question: QuestionId, choice: &str) -> bool {
        match self.engine.answer(question) {
            Some(AnswerValue::Choice(s)) => s == choice,
            Some(AnswerValue::Choices(items)) => items.iter().any(|c| c == choice),
            _ => false,
        }
    }

    /// Toggle one choice of a multi-choice question.
    pub fn toggle_choice(&mut self, question: QuestionId, choice: &str) {
        let mut selected = match self.engine.answer(question) {
            Some(AnswerValue::Choices(items)) => items.clone(),
            Some(AnswerValue::Choice(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };
        if let Some(index) = selected.iter().position(|c| c == choice) {
            selected.remove(index);
        } else {
            selected.push(choice.to_string());
        }
        let _ = self
            .engine
            .record_answer(question, AnswerValue::Choices(selected));
    }

    #[must_use]
    pub fn active_task_number(&self) -> Option<TaskNumber> {
        self.engine.active_task_number()
    }

    #[must_use]
    pub fn task_word_count(&self, task: &WritingTask) -> usize {
        self.engine.task_word_count(task)
    }

    #[must_use]
    pub fn active_gate(&self) -> Option<&PlaybackGate> {
        self.engine.active_gate()
    }

    /// Feed one clock second. The caller routes `Expired` into
    /// [`AttemptVm::submit`] with the expiry trigger.
    pub fn tick(&mut self) -> TickEvent {
        self.engine.tick()
    }

    /// Apply a synchronous interaction. Returns the transport command the
    /// audio element must execute, if any.
    pub fn apply(&mut self, intent: AttemptIntent) -> Option<TransportCommand> {
        match intent {
            AttemptIntent::Answer(question, value) => {
                let _ = self.engine.record_answer(question, value);
                None
            }
            AttemptIntent::Next => {
                self.engine.go_next();
                None
            }
            AttemptIntent::Previous => {
                self.engine.go_previous();
                None
            }
            AttemptIntent::Jump { section, question } => {
                let _ = self.engine.jump_to(section, question);
                None
            }
            AttemptIntent::ToggleAudio => self.engine.toggle_audio(),
        }
    }

    /// Request a seek; returns the clamped target for the media element,
    /// or `None` when the one-play rule refuses it.
    pub fn seek_audio(&mut self, to_seconds: f64) -> Option<f64> {
        self.engine.seek_audio(to_seconds)
    }

    /// Observational audio events from the media element.
    pub fn audio_ended(&mut self) {
        self.engine.audio_ended();
    }

    pub fn audio_duration(&mut self, seconds: f64) {
        self.engine.audio_duration(seconds);
    }

    pub fn audio_position(&mut self, seconds: f64) {
        self.engine.audio_position(seconds);
    }

    pub fn audio_failed(&mut self, reason: impl Into<String>) {
        self.engine.audio_failed(reason);
    }

    /// Stop the clock on unmount without submitting.
    pub fn abandon(&mut self) {
        self.engine.abandon();
    }

    /// Run the exactly-once submission routine.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::SubmitRetryable` when the attempt is back in
    /// progress and may be resubmitted, `ViewError::SubmitTerminal` when
    /// it is failed for good.
    pub async fn submit(
        &mut self,
        attempts: &AttemptLoopService,
        trigger: SubmitTrigger,
    ) -> Result<AttemptOutcome, ViewError> {
        match attempts.submit(&mut self.engine, trigger).await {
            Ok(SubmitOutcome::Submitted(result_id)) => Ok(AttemptOutcome::Completed { result_id }),
            Ok(SubmitOutcome::Suppressed) => Ok(AttemptOutcome::Continue),
            Err(_) => {
                if self.engine.phase() == AttemptPhase::InProgress {
                    Err(ViewError::SubmitRetryable)
                } else {
                    Err(ViewError::SubmitTerminal)
                }
            }
        }
    }
}

/// Fetch the definition and build the view-model for one attempt.
///
/// # Errors
///
/// Returns `ViewError::LoadFailed` when the definition cannot be
/// retrieved; no engine or clock exists in that case.
pub async fn start_attempt(
    attempts: &AttemptLoopService,
    module: ModuleKind,
    test_id: TestId,
    mode: TestMode,
) -> Result<AttemptVm, ViewError> {
    let engine = attempts
        .start_attempt(module, test_id, mode)
        .await
        .map_err(|_| ViewError::LoadFailed)?;
    Ok(AttemptVm::new(engine))
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
