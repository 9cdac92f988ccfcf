use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS (domain validation) ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question type {0:?} requires at least two choices")]
    MissingChoices(QuestionType),

    #[error("unknown question type: {0}")]
    UnknownType(String),
}

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// Closed set of gradable question kinds.
///
/// The server's wire format uses several historical spellings per kind
/// (`radio`, `fill_blank`, `sentence_completion`, …); [`QuestionType::parse_wire`]
/// folds them onto this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Pick exactly one of the offered choices.
    SingleChoice,
    /// Pick any subset of the offered choices.
    MultiChoice,
    /// Free text, typically a short completion.
    FreeText,
    /// Pick one choice from a dropdown; also covers matching exercises.
    Dropdown,
    /// True / False / Not Given verdict about the passage or recording.
    TrueFalseNotGiven,
}

impl QuestionType {
    /// Fold a wire spelling onto the closed set.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::UnknownType` for spellings the portal has
    /// never produced.
    pub fn parse_wire(raw: &str) -> Result<Self, QuestionError> {
        match raw {
            "single_choice" | "radio" => Ok(Self::SingleChoice),
            "multi_choice" => Ok(Self::MultiChoice),
            "free_text" | "text" | "fill_blank" | "short_answer" | "sentence_completion" => {
                Ok(Self::FreeText)
            }
            "dropdown" | "matching" => Ok(Self::Dropdown),
            "true_false_not_given" | "true_false" => Ok(Self::TrueFalseNotGiven),
            other => Err(QuestionError::UnknownType(other.to_string())),
        }
    }

    /// Whether answering this kind requires the definition to carry choices.
    #[must_use]
    pub fn needs_choices(&self) -> bool {
        matches!(
            self,
            Self::SingleChoice | Self::MultiChoice | Self::Dropdown
        )
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Atomic gradable unit of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    question_type: QuestionType,
    prompt: String,
    choices: Vec<String>,
}

impl Question {
    /// Build a question from definition data.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt and
    /// `QuestionError::MissingChoices` when a choice-driven type arrives
    /// with fewer than two choices.
    pub fn new(
        id: QuestionId,
        question_type: QuestionType,
        prompt: impl Into<String>,
        choices: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if question_type.needs_choices() && choices.len() < 2 {
            return Err(QuestionError::MissingChoices(question_type));
        }

        Ok(Self {
            id,
            question_type,
            prompt,
            choices,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Ordered choices; positions are significant, contents may repeat.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }
}

//
// ─── ANSWER VALUE ──────────────────────────────────────────────────────────────
//

/// Current response to a question. Shape follows the question type by
/// convention only; the answer sheet never enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// One selected choice, a dropdown pick, or a TFNG verdict.
    Choice(String),
    /// Selected choices for a multi-choice question. Order carries no meaning.
    Choices(Vec<String>),
    /// Free text.
    Text(String),
}

impl AnswerValue {
    /// A value that carries no content counts as unanswered.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Choice(s) | AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Choices(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Whitespace-separated word count; used for the advisory writing counter.
    #[must_use]
    pub fn word_count(&self) -> usize {
        match self {
            AnswerValue::Choice(s) | AnswerValue::Text(s) => {
                s.split_whitespace().filter(|w| !w.is_empty()).count()
            }
            AnswerValue::Choices(items) => items.len(),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_spellings_fold_onto_closed_set() {
        assert_eq!(
            QuestionType::parse_wire("radio").unwrap(),
            QuestionType::SingleChoice
        );
        assert_eq!(
            QuestionType::parse_wire("sentence_completion").unwrap(),
            QuestionType::FreeText
        );
        assert_eq!(
            QuestionType::parse_wire("matching").unwrap(),
            QuestionType::Dropdown
        );
        assert_eq!(
            QuestionType::parse_wire("true_false").unwrap(),
            QuestionType::TrueFalseNotGiven
        );
        assert!(QuestionType::parse_wire("essay").is_err());
    }

    #[test]
    fn choice_types_require_choices() {
        let err = Question::new(
            QuestionId::new(1),
            QuestionType::Dropdown,
            "Match the speaker",
            vec!["A".into()],
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::MissingChoices(_)));
    }

    #[test]
    fn free_text_needs_no_choices() {
        let q = Question::new(
            QuestionId::new(2),
            QuestionType::FreeText,
            "Complete the sentence",
            Vec::new(),
        )
        .unwrap();
        assert_eq!(q.choices().len(), 0);
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = Question::new(
            QuestionId::new(3),
            QuestionType::FreeText,
            "   ",
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn blankness_follows_content() {
        assert!(AnswerValue::Text(String::new()).is_blank());
        assert!(AnswerValue::Choice("  ".into()).is_blank());
        assert!(AnswerValue::Choices(vec![]).is_blank());
        assert!(!AnswerValue::Choice("True".into()).is_blank());
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        let essay = AnswerValue::Text("one  two\nthree".into());
        assert_eq!(essay.word_count(), 3);
    }
}
