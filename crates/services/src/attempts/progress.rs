use exam_core::model::QuestionId;

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
}

/// Per-question status row for the numbered navigation grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionStatus {
    pub question_id: QuestionId,
    pub answered: bool,
    pub active: bool,
}
