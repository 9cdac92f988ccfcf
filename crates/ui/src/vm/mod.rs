mod attempt_vm;
mod result_vm;
mod time_fmt;

pub use attempt_vm::{AttemptIntent, AttemptOutcome, AttemptVm, start_attempt};
pub use result_vm::{ResultVm, ReviewRowVm, TaskFeedbackVm, map_result};
pub use time_fmt::{format_clock, format_datetime, format_duration};
