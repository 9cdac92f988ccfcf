//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{QuestionError, ResultError, SubmissionError, TestError};

/// Errors emitted by exam API implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("server responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed server payload: {0}")]
    Decode(String),
    #[error("no test definition for id {0}")]
    UnknownTest(u64),
    #[error("no result with id {0}")]
    UnknownResult(u64),
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] ResultError),
}

impl ApiError {
    /// Transient failures may be retried from `InProgress`; terminal ones
    /// leave the attempt `Failed` until a manual retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(_) => true,
            ApiError::HttpStatus(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Engine-level misuse of a session attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt is not in progress")]
    NotInProgress,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error("attempt already reached a terminal state")]
    AlreadyFinished,
    #[error("question {question} in section {section} does not exist")]
    PositionOutOfRange { section: usize, question: usize },
    #[error("question is not part of this attempt")]
    UnknownQuestion,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Errors emitted by the attempt workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptFlowError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
