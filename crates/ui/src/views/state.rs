use dioxus::prelude::*;

/// UI-facing failure categories, mapped from service errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The test definition never arrived; only "retry load" is on offer.
    LoadFailed,
    /// Submission failed but the attempt is still live; resubmitting is
    /// allowed.
    SubmitRetryable,
    /// Submission failed for good; the attempt is over.
    SubmitTerminal,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            ViewError::LoadFailed => "The test could not be loaded. Retry, or go back.",
            ViewError::SubmitRetryable => {
                "Submitting failed. Your answers are safe - try again."
            }
            ViewError::SubmitTerminal => {
                "The server rejected the submission. Try once more, or contact support."
            }
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
