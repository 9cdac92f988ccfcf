mod http;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use exam_core::model::{
    AttemptId, AttemptSubmission, BandScore, ModuleKind, QuestionReview, ResultId, ResultSummary,
    TestDefinition, TestId,
};
use exam_core::time::fixed_now;

use crate::error::ApiError;

pub use http::{HttpExamApi, HttpExamApiConfig};

/// A test definition together with the attempt handle the server issued
/// for this run of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTest {
    pub attempt_id: AttemptId,
    pub definition: TestDefinition,
}

/// Contract for the portal's data API.
///
/// The engine never talks HTTP directly; everything flows through this
/// trait so the workflow can run against canned data in tests.
#[async_trait]
pub trait ExamApi: Send + Sync {
    /// Fetch the immutable definition for one test, starting an attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx responses, or a
    /// payload that does not map onto the domain model.
    async fn fetch_test(&self, module: ModuleKind, id: TestId) -> Result<FetchedTest, ApiError>;

    /// Hand a finished attempt to the scoring collaborator.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or rejection; callers
    /// classify via [`ApiError::is_transient`].
    async fn submit_attempt(&self, submission: &AttemptSubmission) -> Result<ResultId, ApiError>;

    /// Fetch the scored result for a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or unknown result ids.
    async fn fetch_result(&self, module: ModuleKind, id: ResultId) -> Result<ResultSummary, ApiError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

#[derive(Debug, Default)]
struct InMemoryState {
    tests: HashMap<(ModuleKind, TestId), TestDefinition>,
    submissions: Vec<AttemptSubmission>,
    results: HashMap<(ModuleKind, ResultId), ResultSummary>,
    next_attempt: u128,
    next_result: u64,
    submit_failures: Vec<ApiError>,
}

/// Canned exam API for tests and offline demos.
///
/// Registered definitions are served as-is; submissions are recorded and
/// acknowledged with sequential result ids. Failures can be queued to
/// exercise the error paths.
#[derive(Debug, Default)]
pub struct InMemoryExamApi {
    state: Mutex<InMemoryState>,
}

impl InMemoryExamApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its own module and id.
    pub fn insert_test(&self, definition: TestDefinition) {
        let mut state = self.state.lock().expect("in-memory api poisoned");
        state
            .tests
            .insert((definition.module(), definition.id()), definition);
    }

    /// Queue an error for the next `submit_attempt` call.
    pub fn fail_next_submission(&self, error: ApiError) {
        let mut state = self.state.lock().expect("in-memory api poisoned");
        state.submit_failures.push(error);
    }

    /// Submissions recorded so far, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<AttemptSubmission> {
        let state = self.state.lock().expect("in-memory api poisoned");
        state.submissions.clone()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        let state = self.state.lock().expect("in-memory api poisoned");
        state.submissions.len()
    }
}

#[async_trait]
impl ExamApi for InMemoryExamApi {
    async fn fetch_test(&self, module: ModuleKind, id: TestId) -> Result<FetchedTest, ApiError> {
        let mut state = self.state.lock().expect("in-memory api poisoned");
        let definition = state
            .tests
            .get(&(module, id))
            .cloned()
            .ok_or(ApiError::UnknownTest(id.value()))?;

        state.next_attempt += 1;
        let attempt_id = AttemptId::new(Uuid::from_u128(state.next_attempt));
        Ok(FetchedTest {
            attempt_id,
            definition,
        })
    }

    async fn submit_attempt(&self, submission: &AttemptSubmission) -> Result<ResultId, ApiError> {
        let mut state = self.state.lock().expect("in-memory api poisoned");
        if let Some(error) = state.submit_failures.pop() {
            return Err(error);
        }

        state.next_result += 1;
        let result_id = ResultId::new(state.next_result);
        let definition = state
            .tests
            .get(&(submission.module(), submission.test_id()))
            .cloned();
        state.submissions.push(submission.clone());

        // A canned zero-band result so `fetch_result` round-trips in tests.
        if let Some(definition) = definition {
            let total = u32::try_from(definition.question_count()).unwrap_or(0);
            let summary = canned_result(result_id, submission, total)?;
            state
                .results
                .insert((submission.module(), result_id), summary);
        }

        Ok(result_id)
    }

    async fn fetch_result(&self, module: ModuleKind, id: ResultId) -> Result<ResultSummary, ApiError> {
        let state = self.state.lock().expect("in-memory api poisoned");
        state
            .results
            .get(&(module, id))
            .cloned()
            .ok_or(ApiError::UnknownResult(id.value()))
    }
}

fn canned_result(
    id: ResultId,
    submission: &AttemptSubmission,
    total: u32,
) -> Result<ResultSummary, ApiError> {
    let reviews: Vec<QuestionReview> = submission
        .answers()
        .iter()
        .map(|(question_id, value)| QuestionReview {
            question_id: *question_id,
            prompt: String::new(),
            given: Some(value.clone()),
            expected: String::new(),
            is_correct: false,
        })
        .collect();

    Ok(ResultSummary::from_scored(
        id,
        submission.test_id(),
        submission.module(),
        submission.mode(),
        BandScore::from_value(0.0)?,
        0,
        total,
        submission.elapsed_seconds(),
        fixed_now(),
        reviews,
        Vec::new(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{Question, QuestionId, QuestionType, TestMode};

    fn reading_test(id: u64) -> TestDefinition {
        let questions = vec![
            Question::new(QuestionId::new(1), QuestionType::FreeText, "Q1", Vec::new()).unwrap(),
        ];
        TestDefinition::reading(TestId::new(id), "Sample", "passage", questions).unwrap()
    }

    #[tokio::test]
    async fn fetch_issues_fresh_attempt_handles() {
        let api = InMemoryExamApi::new();
        api.insert_test(reading_test(1));

        let first = api
            .fetch_test(ModuleKind::Reading, TestId::new(1))
            .await
            .unwrap();
        let second = api
            .fetch_test(ModuleKind::Reading, TestId::new(1))
            .await
            .unwrap();

        assert_eq!(first.definition, second.definition);
        assert_ne!(first.attempt_id, second.attempt_id);
    }

    #[tokio::test]
    async fn unknown_test_is_an_error() {
        let api = InMemoryExamApi::new();
        let err = api
            .fetch_test(ModuleKind::Reading, TestId::new(9))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownTest(9)));
    }

    #[tokio::test]
    async fn queued_failures_surface_once() {
        let api = InMemoryExamApi::new();
        api.insert_test(reading_test(1));
        let fetched = api
            .fetch_test(ModuleKind::Reading, TestId::new(1))
            .await
            .unwrap();

        let submission = AttemptSubmission::new(
            TestId::new(1),
            fetched.attempt_id,
            ModuleKind::Reading,
            TestMode::Exam,
            std::collections::BTreeMap::new(),
            60,
            None,
        )
        .unwrap();

        api.fail_next_submission(ApiError::Decode("boom".into()));
        assert!(api.submit_attempt(&submission).await.is_err());
        let result_id = api.submit_attempt(&submission).await.unwrap();
        assert_eq!(result_id, ResultId::new(1));
        assert_eq!(api.submission_count(), 1);
    }
}
