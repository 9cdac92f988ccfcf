use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{ModuleKind, ResultId, TestId, TestMode};

use super::engine::{SessionEngine, SubmitTrigger};
use crate::api::ExamApi;
use crate::error::{ApiError, AttemptError, AttemptFlowError};

/// Result of asking the workflow to submit an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The request went out and scoring acknowledged it.
    Submitted(ResultId),
    /// Another trigger already owns the submission; this one was
    /// suppressed without touching the network.
    Suppressed,
}

/// Orchestrates attempt start and exactly-once submission.
///
/// The engine stays synchronous; this service owns the two async
/// boundaries (definition fetch, submission) and translates their
/// failures into engine transitions.
#[derive(Clone)]
pub struct AttemptLoopService {
    clock: Clock,
    api: Arc<dyn ExamApi>,
}

impl AttemptLoopService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn ExamApi>) -> Self {
        Self { clock, api }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch the definition and start the attempt's engine and clock.
    ///
    /// A fetch failure never constructs an engine: the caller stays on
    /// the loading boundary with only "retry" or "go back" available.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the definition cannot be retrieved or does
    /// not map onto the domain model.
    pub async fn start_attempt(
        &self,
        module: ModuleKind,
        test_id: TestId,
        mode: TestMode,
    ) -> Result<SessionEngine, ApiError> {
        let fetched = self.api.fetch_test(module, test_id).await?;
        Ok(SessionEngine::start(
            fetched.attempt_id,
            fetched.definition,
            mode,
            self.clock.now(),
        ))
    }

    /// Run the submission routine for `engine`, manual and expiry paths
    /// alike. The engine's in-flight guard makes this exactly-once: the
    /// losing trigger of a same-turn race returns
    /// [`SubmitOutcome::Suppressed`] and no second request is issued.
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Api` when the request fails, after the
    /// engine has been moved back to `InProgress` (transient, time
    /// remaining) or `Failed`. Answers are never cleared on this path.
    pub async fn submit(
        &self,
        engine: &mut SessionEngine,
        trigger: SubmitTrigger,
    ) -> Result<SubmitOutcome, AttemptFlowError> {
        let submission = match engine.begin_submission(trigger) {
            Ok(submission) => submission,
            Err(AttemptError::SubmissionInFlight | AttemptError::AlreadyFinished) => {
                return Ok(SubmitOutcome::Suppressed);
            }
            Err(err) => return Err(err.into()),
        };

        match self.api.submit_attempt(&submission).await {
            Ok(result_id) => {
                engine.submission_succeeded(result_id)?;
                Ok(SubmitOutcome::Submitted(result_id))
            }
            Err(err) => {
                engine.submission_failed(err.is_transient())?;
                Err(err.into())
            }
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
