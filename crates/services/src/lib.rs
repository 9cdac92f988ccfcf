#![forbid(unsafe_code)]

pub mod api;
pub mod attempts;
pub mod error;

pub use exam_core::Clock;
pub use attempts as attempt;

pub use api::{ExamApi, FetchedTest, HttpExamApi, HttpExamApiConfig, InMemoryExamApi};
pub use error::{ApiError, AttemptError, AttemptFlowError};

pub use attempts::{
    AttemptLoopService, AttemptPhase, AttemptProgress, PlaybackGate, Position, QuestionStatus,
    ResultService, SessionEngine, SubmitOutcome, SubmitTrigger, TickEvent, Transport,
    TransportCommand,
};
