mod ids;
mod question;
mod result;
mod submission;
mod test;

pub use ids::{AttemptId, ParseIdError, QuestionId, ResultId, SectionId, TestId};
pub use question::{AnswerValue, Question, QuestionError, QuestionType};
pub use result::{BandScore, QuestionReview, ResultError, ResultSummary, TaskFeedback};
pub use submission::{AttemptSubmission, SubmissionError, TaskTiming};
pub use test::{
    AssetRef, LISTENING_BUDGET_SECONDS, ListeningSection, ModuleKind, READING_BUDGET_SECONDS,
    TaskNumber, TestDefinition, TestError, TestMode, WRITING_TASK1_BUDGET_SECONDS,
    WRITING_TASK1_MIN_WORDS, WRITING_TASK2_BUDGET_SECONDS, WRITING_TASK2_MIN_WORDS, WritingTask,
};
