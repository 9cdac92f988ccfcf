use chrono::{DateTime, Utc};
use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{ModuleKind, ResultId, ResultSummary};

use crate::api::ExamApi;
use crate::error::ApiError;

/// Presentation-facing facade for scored results.
///
/// Owns the time source and API access so the UI never sees either; it
/// does **not** own UI formatting — the view-model layer renders bands,
/// percentages and durations as it sees fit.
#[derive(Clone)]
pub struct ResultService {
    clock: Clock,
    api: Arc<dyn ExamApi>,
}

impl ResultService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn ExamApi>) -> Self {
        Self { clock, api }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fetch the static, already-scored data for one completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or unknown result ids.
    pub async fn get_result(
        &self,
        module: ModuleKind,
        id: ResultId,
    ) -> Result<ResultSummary, ApiError> {
        self.api.fetch_result(module, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryExamApi;
    use crate::attempts::{AttemptLoopService, SubmitOutcome, SubmitTrigger};
    use exam_core::model::{
        Question, QuestionId, QuestionType, TestDefinition, TestId, TestMode,
    };
    use exam_core::time::fixed_clock;

    #[tokio::test]
    async fn results_round_trip_through_the_api() {
        let api = Arc::new(InMemoryExamApi::new());
        let questions = vec![
            Question::new(QuestionId::new(1), QuestionType::FreeText, "Q1", Vec::new()).unwrap(),
        ];
        api.insert_test(
            TestDefinition::reading(TestId::new(1), "R", "p", questions).unwrap(),
        );

        let attempts =
            AttemptLoopService::new(fixed_clock(), Arc::clone(&api) as Arc<dyn ExamApi>);
        let mut engine = attempts
            .start_attempt(ModuleKind::Reading, TestId::new(1), TestMode::Exam)
            .await
            .unwrap();
        let outcome = attempts
            .submit(&mut engine, SubmitTrigger::Manual)
            .await
            .unwrap();
        let SubmitOutcome::Submitted(result_id) = outcome else {
            panic!("submission was suppressed");
        };

        let results = ResultService::new(fixed_clock(), api as Arc<dyn ExamApi>);
        let summary = results
            .get_result(ModuleKind::Reading, result_id)
            .await
            .unwrap();
        assert_eq!(summary.id(), result_id);
        assert_eq!(summary.total(), 1);
    }

    #[tokio::test]
    async fn unknown_results_surface_as_errors() {
        let api = Arc::new(InMemoryExamApi::new());
        let results = ResultService::new(fixed_clock(), api as Arc<dyn ExamApi>);
        let err = results
            .get_result(ModuleKind::Listening, ResultId::new(12))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownResult(12)));
    }
}
