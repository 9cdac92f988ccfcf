use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::model::{
    AnswerValue, AttemptId, AttemptSubmission, ListeningSection, ModuleKind, Question, QuestionId,
    ResultId, TaskNumber, TaskTiming, TestDefinition, TestMode, WritingTask,
};

use super::answers::AnswerSheet;
use super::countdown::{Countdown, TickOutcome};
use super::cursor::{Position, SectionCursor};
use super::plan::{SessionPlan, Timing};
use super::playback::{PlaybackGate, TransportCommand};
use super::progress::{AttemptProgress, QuestionStatus};
use crate::error::AttemptError;

//
// ─── PHASES & EVENTS ───────────────────────────────────────────────────────────
//

/// Lifecycle of one attempt once its definition has loaded.
///
/// Definition loading (and load failure) lives at the async boundary in
/// the workflow service; an engine only exists for a loaded attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    InProgress,
    Submitting,
    Completed(ResultId),
    Failed,
}

impl AttemptPhase {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptPhase::Completed(_) | AttemptPhase::Failed)
    }
}

/// What started a submission. Both paths run the same routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Expiry,
}

/// Outcome of feeding one clock tick to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    Running { remaining_seconds: u32 },
    /// A writing task ran out of budget; the engine moved the attempt to
    /// the other task, which still has time.
    TaskExpired { switched_to: TaskNumber },
    /// The overall budget is exhausted. Fired exactly once; the caller
    /// must route this into the auto-submit path.
    Expired,
    Idle,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// State machine for one timed attempt.
///
/// Owns the answer sheet, the cursor, the per-section playback gates and
/// the countdown(s) for the attempt's lifetime; everything is dropped
/// together when the attempt view unmounts. All mutation happens through
/// discrete event-handler calls, so no two updates ever interleave.
pub struct SessionEngine {
    attempt_id: AttemptId,
    definition: TestDefinition,
    plan: SessionPlan,
    answers: AnswerSheet,
    cursor: SectionCursor,
    gates: Vec<PlaybackGate>,
    countdowns: Vec<Countdown>,
    phase: AttemptPhase,
    started_at: DateTime<Utc>,
    submitted_by: Option<SubmitTrigger>,
}

impl SessionEngine {
    /// Build and start an engine for a freshly loaded definition. The
    /// module's budget starts counting immediately.
    #[must_use]
    pub fn start(
        attempt_id: AttemptId,
        definition: TestDefinition,
        mode: TestMode,
        started_at: DateTime<Utc>,
    ) -> Self {
        let plan = SessionPlan::for_test(&definition, mode);
        let cursor = SectionCursor::new(plan.shape());
        let gates = if plan.has_playback() {
            (0..plan.section_count()).map(|_| PlaybackGate::new()).collect()
        } else {
            Vec::new()
        };
        let countdowns = match plan.timing() {
            Timing::Single { budget_seconds } => vec![Countdown::started(*budget_seconds)],
            // Task 2's budget stays armed until that task becomes active.
            Timing::PerTask { budgets } => {
                vec![Countdown::started(budgets[0]), Countdown::new(budgets[1])]
            }
        };

        Self {
            attempt_id,
            definition,
            plan,
            answers: AnswerSheet::new(),
            cursor,
            gates,
            countdowns,
            phase: AttemptPhase::InProgress,
            started_at,
            submitted_by: None,
        }
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn definition(&self) -> &TestDefinition {
        &self.definition
    }

    #[must_use]
    pub fn module(&self) -> ModuleKind {
        self.plan.module()
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.plan.mode()
    }

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_by(&self) -> Option<SubmitTrigger> {
        self.submitted_by
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    #[must_use]
    pub fn at_final_question(&self) -> bool {
        self.cursor.at_final_question()
    }

    #[must_use]
    pub fn at_first_question(&self) -> bool {
        self.cursor.at_first_question()
    }

    /// Seconds left across the whole attempt (both tasks for Writing).
    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.countdowns.iter().map(Countdown::remaining_seconds).sum()
    }

    /// Seconds left on the budget currently ticking: the single module
    /// budget, or the active task's budget for Writing.
    #[must_use]
    pub fn active_remaining_seconds(&self) -> u32 {
        let index = self.cursor.position().section.min(self.countdowns.len() - 1);
        self.countdowns[index].remaining_seconds()
    }

    /// `total budget − remaining`, the figure reported to scoring.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.countdowns.iter().map(Countdown::elapsed_seconds).sum()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        let position = self.cursor.position();
        match &self.definition {
            TestDefinition::Reading { questions, .. } => questions.get(position.question),
            TestDefinition::Listening { sections, .. } => sections
                .get(position.section)
                .and_then(|s| s.questions().get(position.question)),
            TestDefinition::Writing { .. } => None,
        }
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&ListeningSection> {
        match &self.definition {
            TestDefinition::Listening { sections, .. } => {
                sections.get(self.cursor.position().section)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn current_task(&self) -> Option<&WritingTask> {
        match &self.definition {
            TestDefinition::Writing { tasks, .. } => tasks.get(self.cursor.position().section),
            _ => None,
        }
    }

    #[must_use]
    pub fn active_task_number(&self) -> Option<TaskNumber> {
        self.current_task().map(WritingTask::number)
    }

    #[must_use]
    pub fn answer(&self, question: QuestionId) -> Option<&AnswerValue> {
        self.answers.answer(question)
    }

    /// Advisory word count for a writing task's current draft.
    #[must_use]
    pub fn task_word_count(&self, task: &WritingTask) -> usize {
        self.answers
            .answer(task.id())
            .map_or(0, AnswerValue::word_count)
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        let total = self.cursor.total_questions();
        let answered = self.answers.answered_count();
        AttemptProgress {
            total,
            answered,
            unanswered: total.saturating_sub(answered),
        }
    }

    /// One status row per question, in presentation order.
    #[must_use]
    pub fn question_statuses(&self) -> Vec<QuestionStatus> {
        let active = self.cursor.flat_index();
        self.plan
            .ordered_questions()
            .into_iter()
            .enumerate()
            .map(|(index, question_id)| QuestionStatus {
                question_id,
                answered: self.answers.is_answered(question_id),
                active: index == active,
            })
            .collect()
    }

    // ─── Clock ─────────────────────────────────────────────────────────────────

    /// Consume one second of budget. Only ticks while `InProgress`; a
    /// submission in flight suspends the clock, and a transient failure
    /// resumes it.
    pub fn tick(&mut self) -> TickEvent {
        if self.phase != AttemptPhase::InProgress {
            return TickEvent::Idle;
        }
        if matches!(self.plan.timing(), Timing::PerTask { .. }) {
            return self.tick_tasks();
        }

        match self.countdowns[0].tick() {
            TickOutcome::Running { remaining } => TickEvent::Running {
                remaining_seconds: remaining,
            },
            TickOutcome::Expired => TickEvent::Expired,
            TickOutcome::Idle => TickEvent::Idle,
        }
    }

    /// Writing: tick the active task's budget, or whichever budget is
    /// still running when the visible task has already expired — time
    /// never freezes just because an exhausted task is on screen.
    fn tick_tasks(&mut self) -> TickEvent {
        let active = self.cursor.position().section;
        let index = if self.countdowns[active].is_running() {
            active
        } else if self.countdowns[1 - active].is_running() {
            1 - active
        } else {
            return TickEvent::Idle;
        };

        match self.countdowns[index].tick() {
            TickOutcome::Running { remaining } => TickEvent::Running {
                remaining_seconds: remaining,
            },
            TickOutcome::Expired => {
                let other = 1 - index;
                if self.countdowns[other].is_expired() {
                    return TickEvent::Expired;
                }
                if !self.countdowns[other].is_running() {
                    self.countdowns[other].start();
                    self.countdowns[other].resume();
                }
                if self.countdowns[other].is_expired() {
                    // Zero-budget edge: starting it expired it outright.
                    return TickEvent::Expired;
                }
                let position = self.cursor.position();
                if position.section != other {
                    let _ = self.cursor.jump(other, 0);
                }
                let switched_to = if other == 0 {
                    TaskNumber::One
                } else {
                    TaskNumber::Two
                };
                TickEvent::TaskExpired { switched_to }
            }
            TickOutcome::Idle => TickEvent::Idle,
        }
    }

    // ─── Answers ───────────────────────────────────────────────────────────────

    /// Record or overwrite an answer. Shape is never validated; blank
    /// values simply leave the question unanswered.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotInProgress` outside `InProgress` and
    /// `AttemptError::UnknownQuestion` for ids outside this attempt.
    pub fn record_answer(
        &mut self,
        question: QuestionId,
        value: AnswerValue,
    ) -> Result<(), AttemptError> {
        if self.phase != AttemptPhase::InProgress {
            return Err(AttemptError::NotInProgress);
        }
        if !self.plan.contains(question) {
            return Err(AttemptError::UnknownQuestion);
        }
        self.answers.record(question, value);
        Ok(())
    }

    // ─── Navigation ────────────────────────────────────────────────────────────

    /// Advance to the next question / task. Saturates at the end.
    pub fn go_next(&mut self) -> Position {
        if self.phase != AttemptPhase::InProgress {
            return self.cursor.position();
        }
        let from = self.cursor.position();
        let to = self.cursor.next();
        self.after_move(from, to);
        to
    }

    /// Step back to the previous question / task. Saturates at the start.
    pub fn go_previous(&mut self) -> Position {
        if self.phase != AttemptPhase::InProgress {
            return self.cursor.position();
        }
        let from = self.cursor.position();
        let to = self.cursor.previous();
        self.after_move(from, to);
        to
    }

    /// Jump straight to a position via the question grid.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotInProgress` outside `InProgress`, or
    /// `AttemptError::PositionOutOfRange` for bad coordinates.
    pub fn jump_to(&mut self, section: usize, question: usize) -> Result<Position, AttemptError> {
        if self.phase != AttemptPhase::InProgress {
            return Err(AttemptError::NotInProgress);
        }
        let from = self.cursor.position();
        let to = self.cursor.jump(section, question)?;
        self.after_move(from, to);
        Ok(to)
    }

    fn after_move(&mut self, from: Position, to: Position) {
        if from.section == to.section {
            return;
        }
        // Leaving a section mid-play pauses its gate; entering one resets
        // the gate to `Idle` for a fresh play-through unless its recording
        // already finished (the one-play rule survives revisits).
        if let Some(gate) = self.gates.get_mut(from.section) {
            gate.interrupt();
        }
        if let Some(gate) = self.gates.get_mut(to.section) {
            gate.reactivate();
        }
        // A writing task's budget starts counting the first time the
        // task becomes active.
        if matches!(self.plan.timing(), Timing::PerTask { .. }) {
            self.countdowns[to.section].start();
        }
    }

    // ─── Playback (Listening) ──────────────────────────────────────────────────

    #[must_use]
    pub fn gate(&self, section: usize) -> Option<&PlaybackGate> {
        self.gates.get(section)
    }

    #[must_use]
    pub fn active_gate(&self) -> Option<&PlaybackGate> {
        self.gates.get(self.cursor.position().section)
    }

    /// User pressed play/pause for the active section. `None` when the
    /// one-play rule rejects the request or the attempt is not running.
    pub fn toggle_audio(&mut self) -> Option<TransportCommand> {
        if self.phase != AttemptPhase::InProgress {
            return None;
        }
        let section = self.cursor.position().section;
        self.gates.get_mut(section).and_then(PlaybackGate::toggle)
    }

    /// User dragged the progress bar. Returns the clamped seek target.
    pub fn seek_audio(&mut self, to_seconds: f64) -> Option<f64> {
        if self.phase != AttemptPhase::InProgress {
            return None;
        }
        let section = self.cursor.position().section;
        self.gates
            .get_mut(section)
            .and_then(|gate| gate.seek(to_seconds))
    }

    /// The active section's recording reached its natural end.
    pub fn audio_ended(&mut self) {
        let section = self.cursor.position().section;
        if let Some(gate) = self.gates.get_mut(section) {
            gate.natural_end();
        }
    }

    /// Time-update event from the media element.
    pub fn audio_position(&mut self, seconds: f64) {
        let section = self.cursor.position().section;
        if let Some(gate) = self.gates.get_mut(section) {
            gate.position_changed(seconds);
        }
    }

    /// Metadata-loaded event from the media element.
    pub fn audio_duration(&mut self, seconds: f64) {
        let section = self.cursor.position().section;
        if let Some(gate) = self.gates.get_mut(section) {
            gate.duration_loaded(seconds);
        }
    }

    /// The media element failed; the section stays answerable.
    pub fn audio_failed(&mut self, reason: impl Into<String>) {
        let section = self.cursor.position().section;
        if let Some(gate) = self.gates.get_mut(section) {
            gate.fail(reason);
        }
    }

    // ─── Submission ────────────────────────────────────────────────────────────

    /// Move to `Submitting` and freeze the payload. This is the single
    /// in-flight guard: whichever trigger arrives first wins, every later
    /// call is refused, so one attempt produces at most one request at a
    /// time regardless of how manual submit and expiry interleave.
    ///
    /// A `Failed` attempt accepts one more `Manual` trigger (the user's
    /// explicit retry); auto-submit never re-fires there.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::SubmissionInFlight` while a submission is
    /// outstanding and `AttemptError::AlreadyFinished` from terminal
    /// phases.
    pub fn begin_submission(
        &mut self,
        trigger: SubmitTrigger,
    ) -> Result<AttemptSubmission, AttemptError> {
        match self.phase {
            AttemptPhase::InProgress => {}
            AttemptPhase::Failed if trigger == SubmitTrigger::Manual => {}
            AttemptPhase::Submitting => return Err(AttemptError::SubmissionInFlight),
            AttemptPhase::Completed(_) | AttemptPhase::Failed => {
                return Err(AttemptError::AlreadyFinished);
            }
        }

        let task_timings = match self.plan.timing() {
            Timing::Single { .. } => None,
            Timing::PerTask { .. } => Some([
                TaskTiming {
                    number: TaskNumber::One,
                    elapsed_seconds: self.countdowns[0].elapsed_seconds(),
                },
                TaskTiming {
                    number: TaskNumber::Two,
                    elapsed_seconds: self.countdowns[1].elapsed_seconds(),
                },
            ]),
        };

        let submission = AttemptSubmission::new(
            self.definition.id(),
            self.attempt_id,
            self.plan.module(),
            self.plan.mode(),
            self.answers.snapshot(),
            self.elapsed_seconds(),
            task_timings,
        )?;

        self.phase = AttemptPhase::Submitting;
        self.submitted_by = Some(trigger);
        Ok(submission)
    }

    /// Scoring acknowledged the attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotSubmitting` unless a submission is in
    /// flight.
    pub fn submission_succeeded(&mut self, result: ResultId) -> Result<(), AttemptError> {
        if self.phase != AttemptPhase::Submitting {
            return Err(AttemptError::NotSubmitting);
        }
        for countdown in &mut self.countdowns {
            countdown.stop();
        }
        self.phase = AttemptPhase::Completed(result);
        Ok(())
    }

    /// The submission request failed. Transient failures hand the attempt
    /// back to `InProgress` while time remains (answers intact, clock
    /// resumes); anything else is terminal until a manual retry.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotSubmitting` unless a submission is in
    /// flight.
    pub fn submission_failed(&mut self, transient: bool) -> Result<(), AttemptError> {
        if self.phase != AttemptPhase::Submitting {
            return Err(AttemptError::NotSubmitting);
        }
        if transient && self.remaining_seconds() > 0 {
            // A clock stopped by an earlier terminal failure starts
            // counting again once the attempt is live.
            for countdown in &mut self.countdowns {
                countdown.resume();
            }
            self.phase = AttemptPhase::InProgress;
            self.submitted_by = None;
        } else {
            for countdown in &mut self.countdowns {
                countdown.stop();
            }
            self.phase = AttemptPhase::Failed;
        }
        Ok(())
    }

    /// The user navigated away without submitting. Stops the clock; the
    /// attempt is simply dropped, not failed.
    pub fn abandon(&mut self) {
        for countdown in &mut self.countdowns {
            countdown.stop();
        }
    }
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("attempt_id", &self.attempt_id)
            .field("module", &self.plan.module())
            .field("phase", &self.phase)
            .field("position", &self.cursor.position())
            .field("answered", &self.answers.answered_count())
            .field("remaining_seconds", &self.remaining_seconds())
            .finish_non_exhaustive()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
