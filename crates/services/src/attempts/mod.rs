mod answers;
mod countdown;
mod cursor;
mod engine;
mod plan;
mod playback;
mod progress;
mod view;
mod workflow;

// Public API of the attempt subsystem.
pub use crate::error::{AttemptError, AttemptFlowError};
pub use answers::{AnswerSheet, AnswerSnapshot};
pub use countdown::{Countdown, CountdownPhase, TickOutcome};
pub use cursor::{NavShape, Position, SectionCursor};
pub use engine::{AttemptPhase, SessionEngine, SubmitTrigger, TickEvent};
pub use plan::{SessionPlan, Timing};
pub use playback::{PlaybackGate, Transport, TransportCommand};
pub use progress::{AttemptProgress, QuestionStatus};
pub use view::ResultService;
pub use workflow::{AttemptLoopService, SubmitOutcome};
