use exam_core::model::{AnswerValue, ModuleKind, ResultSummary};

use super::time_fmt::{format_datetime, format_duration};

/// One scored question row, ready for the result table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewRowVm {
    pub number: usize,
    pub prompt: String,
    pub given: String,
    pub expected: String,
    pub is_correct: bool,
}

/// Per-task assessment row for writing results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFeedbackVm {
    pub label: &'static str,
    pub band: String,
    pub feedback: String,
    pub word_count: usize,
}

/// Formatted, read-only rendering data for a completed attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultVm {
    pub module_label: &'static str,
    pub mode_label: &'static str,
    pub band: String,
    pub score_line: String,
    pub duration: String,
    pub completed_at: String,
    pub rows: Vec<ReviewRowVm>,
    pub tasks: Vec<TaskFeedbackVm>,
}

#[must_use]
pub fn map_result(summary: &ResultSummary) -> ResultVm {
    let rows = summary
        .reviews()
        .iter()
        .enumerate()
        .map(|(index, review)| ReviewRowVm {
            number: index + 1,
            prompt: review.prompt.clone(),
            given: review
                .given
                .as_ref()
                .map_or_else(|| "-".to_string(), answer_label),
            expected: review.expected.clone(),
            is_correct: review.is_correct,
        })
        .collect();

    let tasks = summary
        .task_feedback()
        .iter()
        .map(|task| TaskFeedbackVm {
            label: task.number.label(),
            band: task.band.to_string(),
            feedback: task.feedback.clone(),
            word_count: task.word_count,
        })
        .collect();

    ResultVm {
        module_label: module_label(summary.module()),
        mode_label: match summary.mode().as_str() {
            "practice" => "Practice",
            _ => "Exam",
        },
        band: summary.band().to_string(),
        score_line: format!("{} / {} correct", summary.correct(), summary.total()),
        duration: format_duration(summary.time_taken_seconds()),
        completed_at: format_datetime(summary.completed_at()),
        rows,
        tasks,
    }
}

fn answer_label(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Choice(s) | AnswerValue::Text(s) => s.clone(),
        AnswerValue::Choices(items) => items.join(", "),
    }
}

fn module_label(module: ModuleKind) -> &'static str {
    match module {
        ModuleKind::Reading => "Reading",
        ModuleKind::Listening => "Listening",
        ModuleKind::Writing => "Writing",
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        BandScore, QuestionId, QuestionReview, ResultId, TaskFeedback, TaskNumber, TestId,
        TestMode,
    };
    use exam_core::time::fixed_now;

    #[test]
    fn maps_reviews_and_band_for_display() {
        let summary = ResultSummary::from_scored(
            ResultId::new(5),
            TestId::new(1),
            ModuleKind::Reading,
            TestMode::Exam,
            BandScore::from_value(6.5).unwrap(),
            3,
            4,
            3250,
            fixed_now(),
            vec![QuestionReview {
                question_id: QuestionId::new(1),
                prompt: "T or F?".into(),
                given: None,
                expected: "True".into(),
                is_correct: false,
            }],
            Vec::new(),
        )
        .unwrap();

        let vm = map_result(&summary);
        assert_eq!(vm.band, "6.5");
        assert_eq!(vm.score_line, "3 / 4 correct");
        assert_eq!(vm.duration, "54m 10s");
        assert_eq!(vm.rows[0].given, "-");
        assert_eq!(vm.module_label, "Reading");
    }

    #[test]
    fn maps_task_feedback_rows() {
        let summary = ResultSummary::from_scored(
            ResultId::new(7),
            TestId::new(2),
            ModuleKind::Writing,
            TestMode::Practice,
            BandScore::from_value(7.0).unwrap(),
            0,
            2,
            3100,
            fixed_now(),
            Vec::new(),
            vec![TaskFeedback {
                number: TaskNumber::One,
                band: BandScore::from_value(6.0).unwrap(),
                feedback: "Good structure.".into(),
                word_count: 163,
            }],
        )
        .unwrap();

        let vm = map_result(&summary);
        assert_eq!(vm.tasks.len(), 1);
        assert_eq!(vm.tasks[0].label, "Task 1");
        assert_eq!(vm.tasks[0].band, "6.0");
        assert_eq!(vm.mode_label, "Practice");
    }
}
