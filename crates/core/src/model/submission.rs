use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{AttemptId, QuestionId, TestId};
use crate::model::question::AnswerValue;
use crate::model::test::{ModuleKind, TaskNumber, TestMode};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("a writing submission must carry both task timings")]
    MissingTaskTimings,

    #[error("task timings are only meaningful for writing submissions")]
    UnexpectedTaskTimings,
}

/// Time spent on one writing task, tracked independently of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTiming {
    pub number: TaskNumber,
    pub elapsed_seconds: u32,
}

/// Everything the scoring collaborator needs about a finished attempt.
///
/// Built exactly once per attempt by the session engine; the answer map
/// is a frozen snapshot, so a store mutated after submission started can
/// never leak into an in-flight request. Unanswered questions are simply
/// absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSubmission {
    test_id: TestId,
    attempt_id: AttemptId,
    module: ModuleKind,
    mode: TestMode,
    answers: BTreeMap<QuestionId, AnswerValue>,
    elapsed_seconds: u32,
    task_timings: Option<[TaskTiming; 2]>,
}

impl AttemptSubmission {
    /// # Errors
    ///
    /// Returns `SubmissionError` when task timings and module disagree:
    /// writing submissions must carry both, the other modules none.
    pub fn new(
        test_id: TestId,
        attempt_id: AttemptId,
        module: ModuleKind,
        mode: TestMode,
        answers: BTreeMap<QuestionId, AnswerValue>,
        elapsed_seconds: u32,
        task_timings: Option<[TaskTiming; 2]>,
    ) -> Result<Self, SubmissionError> {
        match (module, task_timings.is_some()) {
            (ModuleKind::Writing, false) => return Err(SubmissionError::MissingTaskTimings),
            (ModuleKind::Reading | ModuleKind::Listening, true) => {
                return Err(SubmissionError::UnexpectedTaskTimings);
            }
            _ => {}
        }

        Ok(Self {
            test_id,
            attempt_id,
            module,
            mode,
            answers,
            elapsed_seconds,
            task_timings,
        })
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
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
    pub fn answers(&self) -> &BTreeMap<QuestionId, AnswerValue> {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, id: QuestionId) -> Option<&AnswerValue> {
        self.answers.get(&id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn task_timings(&self) -> Option<&[TaskTiming; 2]> {
        self.task_timings.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn attempt_id() -> AttemptId {
        AttemptId::new(Uuid::nil())
    }

    #[test]
    fn writing_without_timings_is_rejected() {
        let err = AttemptSubmission::new(
            TestId::new(1),
            attempt_id(),
            ModuleKind::Writing,
            TestMode::Exam,
            BTreeMap::new(),
            100,
            None,
        )
        .unwrap_err();
        assert_eq!(err, SubmissionError::MissingTaskTimings);
    }

    #[test]
    fn reading_with_timings_is_rejected() {
        let timings = [
            TaskTiming {
                number: TaskNumber::One,
                elapsed_seconds: 10,
            },
            TaskTiming {
                number: TaskNumber::Two,
                elapsed_seconds: 20,
            },
        ];
        let err = AttemptSubmission::new(
            TestId::new(1),
            attempt_id(),
            ModuleKind::Reading,
            TestMode::Exam,
            BTreeMap::new(),
            30,
            Some(timings),
        )
        .unwrap_err();
        assert_eq!(err, SubmissionError::UnexpectedTaskTimings);
    }

    #[test]
    fn answers_are_queryable_by_question() {
        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::new(7), AnswerValue::Choice("True".into()));
        let submission = AttemptSubmission::new(
            TestId::new(1),
            attempt_id(),
            ModuleKind::Reading,
            TestMode::Practice,
            answers,
            42,
            None,
        )
        .unwrap();

        assert_eq!(submission.answered_count(), 1);
        assert_eq!(
            submission.answer(QuestionId::new(7)),
            Some(&AnswerValue::Choice("True".into()))
        );
        assert_eq!(submission.answer(QuestionId::new(8)), None);
        assert_eq!(submission.elapsed_seconds(), 42);
    }
}
