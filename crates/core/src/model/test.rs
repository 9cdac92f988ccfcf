use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::{QuestionId, SectionId, TestId};
use crate::model::question::Question;

//
// ─── ERRORS (domain validation) ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TestError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("a test definition needs at least one question")]
    NoQuestions,

    #[error("listening section {0} has no questions")]
    EmptySection(SectionId),

    #[error("asset reference cannot be empty or malformed")]
    InvalidAssetUrl,

    #[error("unknown test mode: {0}")]
    UnknownMode(String),
}

//
// ─── MODE & MODULE ─────────────────────────────────────────────────────────────
//

/// How the attempt is scored downstream. Engine behavior is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    Exam,
    Practice,
}

impl TestMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TestMode::Exam => "exam",
            TestMode::Practice => "practice",
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestMode {
    type Err = TestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exam" => Ok(Self::Exam),
            "practice" => Ok(Self::Practice),
            other => Err(TestError::UnknownMode(other.to_string())),
        }
    }
}

/// The three portal modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Reading,
    Listening,
    Writing,
}

impl ModuleKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Reading => "reading",
            ModuleKind::Listening => "listening",
            ModuleKind::Writing => "writing",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Fixed module budgets, in seconds. These mirror the exam format and are
// not configurable per test.
pub const READING_BUDGET_SECONDS: u32 = 60 * 60;
pub const LISTENING_BUDGET_SECONDS: u32 = 30 * 60;
pub const WRITING_TASK1_BUDGET_SECONDS: u32 = 20 * 60;
pub const WRITING_TASK2_BUDGET_SECONDS: u32 = 40 * 60;

/// Advisory minimum word counts for the writing tasks.
pub const WRITING_TASK1_MIN_WORDS: usize = 150;
pub const WRITING_TASK2_MIN_WORDS: usize = 250;

//
// ─── ASSETS ────────────────────────────────────────────────────────────────────
//

/// Reference to a media asset (section audio, task chart image).
///
/// The engine never fetches or decodes these; they are handed to the
/// platform media element as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef(Url);

impl AssetRef {
    /// Parse an asset URL.
    ///
    /// # Errors
    ///
    /// Returns `TestError::InvalidAssetUrl` for blank or unparseable input.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, TestError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(TestError::InvalidAssetUrl);
        }
        let url = Url::parse(s).map_err(|_| TestError::InvalidAssetUrl)?;
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

//
// ─── SECTIONS & TASKS ──────────────────────────────────────────────────────────
//

/// One Listening section: a recording plus the questions asked about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningSection {
    id: SectionId,
    title: String,
    instructions: String,
    audio: AssetRef,
    questions: Vec<Question>,
}

impl ListeningSection {
    /// # Errors
    ///
    /// Returns `TestError::EmptySection` when no questions are supplied.
    pub fn new(
        id: SectionId,
        title: impl Into<String>,
        instructions: impl Into<String>,
        audio: AssetRef,
        questions: Vec<Question>,
    ) -> Result<Self, TestError> {
        if questions.is_empty() {
            return Err(TestError::EmptySection(id));
        }
        Ok(Self {
            id,
            title: title.into(),
            instructions: instructions.into(),
            audio,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    #[must_use]
    pub fn audio(&self) -> &AssetRef {
        &self.audio
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

/// Position of a writing task within the test. Exactly two exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskNumber {
    One,
    Two,
}

impl TaskNumber {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            TaskNumber::One => 0,
            TaskNumber::Two => 1,
        }
    }

    #[must_use]
    pub fn other(&self) -> Self {
        match self {
            TaskNumber::One => TaskNumber::Two,
            TaskNumber::Two => TaskNumber::One,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TaskNumber::One => "Task 1",
            TaskNumber::Two => "Task 2",
        }
    }
}

/// One of the two writing prompts. The task itself is the gradable unit,
/// so it carries a `QuestionId` for the answer sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingTask {
    id: QuestionId,
    number: TaskNumber,
    prompt: String,
    chart: Option<AssetRef>,
    min_words: usize,
    budget_seconds: u32,
}

impl WritingTask {
    #[must_use]
    pub fn new(
        id: QuestionId,
        number: TaskNumber,
        prompt: impl Into<String>,
        chart: Option<AssetRef>,
    ) -> Self {
        let (min_words, budget_seconds) = match number {
            TaskNumber::One => (WRITING_TASK1_MIN_WORDS, WRITING_TASK1_BUDGET_SECONDS),
            TaskNumber::Two => (WRITING_TASK2_MIN_WORDS, WRITING_TASK2_BUDGET_SECONDS),
        };
        Self {
            id,
            number,
            prompt: prompt.into(),
            chart,
            min_words,
            budget_seconds,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn number(&self) -> TaskNumber {
        self.number
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn chart(&self) -> Option<&AssetRef> {
        self.chart.as_ref()
    }

    /// Advisory threshold; never gates submission.
    #[must_use]
    pub fn min_words(&self) -> usize {
        self.min_words
    }

    #[must_use]
    pub fn budget_seconds(&self) -> u32 {
        self.budget_seconds
    }
}

//
// ─── TEST DEFINITION ───────────────────────────────────────────────────────────
//

/// Immutable definition of one test, fetched once per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestDefinition {
    Reading {
        id: TestId,
        title: String,
        passage: String,
        questions: Vec<Question>,
    },
    Listening {
        id: TestId,
        title: String,
        sections: Vec<ListeningSection>,
    },
    Writing {
        id: TestId,
        title: String,
        tasks: [WritingTask; 2],
    },
}

impl TestDefinition {
    /// # Errors
    ///
    /// Returns `TestError::NoQuestions` when the question list is empty.
    pub fn reading(
        id: TestId,
        title: impl Into<String>,
        passage: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, TestError> {
        if questions.is_empty() {
            return Err(TestError::NoQuestions);
        }
        Ok(Self::Reading {
            id,
            title: title.into(),
            passage: passage.into(),
            questions,
        })
    }

    /// # Errors
    ///
    /// Returns `TestError::NoQuestions` when no sections are supplied.
    pub fn listening(
        id: TestId,
        title: impl Into<String>,
        sections: Vec<ListeningSection>,
    ) -> Result<Self, TestError> {
        if sections.is_empty() {
            return Err(TestError::NoQuestions);
        }
        Ok(Self::Listening {
            id,
            title: title.into(),
            sections,
        })
    }

    #[must_use]
    pub fn writing(id: TestId, title: impl Into<String>, tasks: [WritingTask; 2]) -> Self {
        Self::Writing {
            id,
            title: title.into(),
            tasks,
        }
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        match self {
            Self::Reading { id, .. } | Self::Listening { id, .. } | Self::Writing { id, .. } => *id,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Reading { title, .. }
            | Self::Listening { title, .. }
            | Self::Writing { title, .. } => title,
        }
    }

    #[must_use]
    pub fn module(&self) -> ModuleKind {
        match self {
            Self::Reading { .. } => ModuleKind::Reading,
            Self::Listening { .. } => ModuleKind::Listening,
            Self::Writing { .. } => ModuleKind::Writing,
        }
    }

    /// Total time budget for the attempt, across all tasks for Writing.
    #[must_use]
    pub fn budget_seconds(&self) -> u32 {
        match self {
            Self::Reading { .. } => READING_BUDGET_SECONDS,
            Self::Listening { .. } => LISTENING_BUDGET_SECONDS,
            Self::Writing { tasks, .. } => {
                tasks.iter().map(WritingTask::budget_seconds).sum()
            }
        }
    }

    /// Ordered ids of every gradable unit in the attempt.
    #[must_use]
    pub fn question_ids(&self) -> Vec<QuestionId> {
        match self {
            Self::Reading { questions, .. } => questions.iter().map(Question::id).collect(),
            Self::Listening { sections, .. } => sections
                .iter()
                .flat_map(|s| s.questions().iter().map(Question::id))
                .collect(),
            Self::Writing { tasks, .. } => tasks.iter().map(WritingTask::id).collect(),
        }
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_ids().len()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionType;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionType::FreeText,
            format!("Q{id}"),
            Vec::new(),
        )
        .unwrap()
    }

    fn audio() -> AssetRef {
        AssetRef::parse("https://cdn.example.com/s1.mp3").unwrap()
    }

    #[test]
    fn reading_requires_questions() {
        let err =
            TestDefinition::reading(TestId::new(1), "Reading", "passage", Vec::new()).unwrap_err();
        assert_eq!(err, TestError::NoQuestions);
    }

    #[test]
    fn listening_sections_reject_empty_question_lists() {
        let err = ListeningSection::new(SectionId::new(4), "S1", "Listen", audio(), Vec::new())
            .unwrap_err();
        assert_eq!(err, TestError::EmptySection(SectionId::new(4)));
    }

    #[test]
    fn budgets_follow_the_exam_format() {
        let reading =
            TestDefinition::reading(TestId::new(1), "R", "p", vec![question(1)]).unwrap();
        assert_eq!(reading.budget_seconds(), 3600);

        let writing = TestDefinition::writing(
            TestId::new(2),
            "W",
            [
                WritingTask::new(QuestionId::new(1), TaskNumber::One, "Describe", None),
                WritingTask::new(QuestionId::new(2), TaskNumber::Two, "Discuss", None),
            ],
        );
        assert_eq!(writing.budget_seconds(), 3600);
        assert_eq!(writing.question_count(), 2);
    }

    #[test]
    fn question_ids_preserve_section_order() {
        let s1 = ListeningSection::new(
            SectionId::new(1),
            "S1",
            "i",
            audio(),
            vec![question(10), question(11)],
        )
        .unwrap();
        let s2 =
            ListeningSection::new(SectionId::new(2), "S2", "i", audio(), vec![question(20)])
                .unwrap();
        let test = TestDefinition::listening(TestId::new(3), "L", vec![s1, s2]).unwrap();

        let ids: Vec<u64> = test.question_ids().iter().map(QuestionId::value).collect();
        assert_eq!(ids, vec![10, 11, 20]);
    }

    #[test]
    fn asset_ref_rejects_blank_and_malformed() {
        assert!(AssetRef::parse("  ").is_err());
        assert!(AssetRef::parse("not a url").is_err());
        assert_eq!(audio().as_str(), "https://cdn.example.com/s1.mp3");
    }

    #[test]
    fn task_defaults_follow_task_number() {
        let t1 = WritingTask::new(QuestionId::new(1), TaskNumber::One, "p", None);
        assert_eq!(t1.min_words(), 150);
        assert_eq!(t1.budget_seconds(), 1200);
        let t2 = WritingTask::new(QuestionId::new(2), TaskNumber::Two, "p", None);
        assert_eq!(t2.min_words(), 250);
        assert_eq!(t2.budget_seconds(), 2400);
        assert_eq!(TaskNumber::One.other(), TaskNumber::Two);
    }
}
