use thiserror::Error;

use crate::model::{QuestionError, ResultError, SubmissionError, TestError};

/// Umbrella error for domain validation failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Result(#[from] ResultError),
}
