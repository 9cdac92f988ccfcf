use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{QuestionId, ResultId, TestId};
use crate::model::question::AnswerValue;
use crate::model::test::{ModuleKind, TaskNumber, TestMode};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("band score {0} is outside the 0.0-9.0 half-step scale")]
    InvalidBand(f32),

    #[error("correct count ({correct}) exceeds question total ({total})")]
    CountMismatch { correct: u32, total: u32 },
}

//
// ─── BAND SCORE ────────────────────────────────────────────────────────────────
//

/// Proficiency band on the exam's 0.0–9.0 half-step scale.
///
/// Stored as half-band increments so equality and ordering stay exact;
/// the scoring collaborator supplies the value, the client only renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BandScore(u8);

impl BandScore {
    /// # Errors
    ///
    /// Returns `ResultError::InvalidBand` for values off the scale or not
    /// on a half-step boundary.
    pub fn from_value(value: f32) -> Result<Self, ResultError> {
        if !(0.0..=9.0).contains(&value) {
            return Err(ResultError::InvalidBand(value));
        }
        let doubled = value * 2.0;
        if (doubled - doubled.round()).abs() > f32::EPSILON {
            return Err(ResultError::InvalidBand(value));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let half_steps = doubled.round() as u8;
        Ok(Self(half_steps))
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        f32::from(self.0) / 2.0
    }
}

impl fmt::Display for BandScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}.0", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

//
// ─── RESULT DETAIL ─────────────────────────────────────────────────────────────
//

/// Scored verdict for one question, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub prompt: String,
    pub given: Option<AnswerValue>,
    pub expected: String,
    pub is_correct: bool,
}

/// Per-task assessment for a writing submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFeedback {
    pub number: TaskNumber,
    pub band: BandScore,
    pub feedback: String,
    pub word_count: usize,
}

/// Static, already-scored result data for one completed attempt.
///
/// The client never computes any of this; it is fetched and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    id: ResultId,
    test_id: TestId,
    module: ModuleKind,
    mode: TestMode,
    band: BandScore,
    correct: u32,
    total: u32,
    time_taken_seconds: u32,
    completed_at: DateTime<Utc>,
    reviews: Vec<QuestionReview>,
    task_feedback: Vec<TaskFeedback>,
}

impl ResultSummary {
    /// Rehydrate a result from server data.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::CountMismatch` when `correct > total`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_scored(
        id: ResultId,
        test_id: TestId,
        module: ModuleKind,
        mode: TestMode,
        band: BandScore,
        correct: u32,
        total: u32,
        time_taken_seconds: u32,
        completed_at: DateTime<Utc>,
        reviews: Vec<QuestionReview>,
        task_feedback: Vec<TaskFeedback>,
    ) -> Result<Self, ResultError> {
        if correct > total {
            return Err(ResultError::CountMismatch { correct, total });
        }
        Ok(Self {
            id,
            test_id,
            module,
            mode,
            band,
            correct,
            total,
            time_taken_seconds,
            completed_at,
            reviews,
            task_feedback,
        })
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    #[must_use]
    pub fn module(&self) -> ModuleKind {
        self.module
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn band(&self) -> BandScore {
        self.band
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn time_taken_seconds(&self) -> u32 {
        self.time_taken_seconds
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn reviews(&self) -> &[QuestionReview] {
        &self.reviews
    }

    #[must_use]
    pub fn task_feedback(&self) -> &[TaskFeedback] {
        &self.task_feedback
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
