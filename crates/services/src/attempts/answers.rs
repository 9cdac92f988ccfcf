use std::collections::{BTreeMap, HashMap};

use exam_core::model::{AnswerValue, QuestionId};

/// Immutable copy of the non-blank answers at one instant, keyed for
/// stable iteration. This is what actually leaves the client.
pub type AnswerSnapshot = BTreeMap<QuestionId, AnswerValue>;

/// Mapping from question id to the current response, for one attempt.
///
/// Values are overwritten, never deleted, and never validated against the
/// question's declared type (that is a presentation concern). A blank
/// value counts as unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    entries: HashMap<QuestionId, AnswerValue>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the response for `question`. Last write wins.
    pub fn record(&mut self, question: QuestionId, value: AnswerValue) {
        self.entries.insert(question, value);
    }

    #[must_use]
    pub fn answer(&self, question: QuestionId) -> Option<&AnswerValue> {
        self.entries.get(&question)
    }

    /// Whether a non-blank response exists for `question`.
    #[must_use]
    pub fn is_answered(&self, question: QuestionId) -> bool {
        self.entries
            .get(&question)
            .is_some_and(|value| !value.is_blank())
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.values().filter(|v| !v.is_blank()).count()
    }

    /// Frozen copy for submission. Blank values are dropped: absence of a
    /// key is the wire representation of "unanswered". A sheet mutated
    /// after this call cannot affect an in-flight request.
    #[must_use]
    pub fn snapshot(&self) -> AnswerSnapshot {
        self.entries
            .iter()
            .filter(|(_, value)| !value.is_blank())
            .map(|(id, value)| (*id, value.clone()))
            .collect()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
