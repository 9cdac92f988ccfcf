use exam_core::model::{ModuleKind, Question, QuestionId, TestDefinition, TestMode};

use super::cursor::{NavShape, Position};

/// How the attempt's budget is carved up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timing {
    /// One budget covering the whole attempt (Reading, Listening).
    Single { budget_seconds: u32 },
    /// Independent budgets gated by the active task (Writing).
    PerTask { budgets: [u32; 2] },
}

/// Variant configuration for one attempt, derived once from the test
/// definition.
///
/// This is what collapses the three per-module engines into one: budget
/// shape, navigation topology and playback presence are data here rather
/// than separate implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    module: ModuleKind,
    mode: TestMode,
    timing: Timing,
    shape: NavShape,
    per_section: Vec<Vec<QuestionId>>,
}

impl SessionPlan {
    #[must_use]
    pub fn for_test(definition: &TestDefinition, mode: TestMode) -> Self {
        let (timing, shape, per_section) = match definition {
            TestDefinition::Reading { questions, .. } => (
                Timing::Single {
                    budget_seconds: definition.budget_seconds(),
                },
                NavShape::Flat {
                    questions: questions.len(),
                },
                vec![questions.iter().map(Question::id).collect()],
            ),
            TestDefinition::Listening { sections, .. } => (
                Timing::Single {
                    budget_seconds: definition.budget_seconds(),
                },
                NavShape::Sectioned {
                    counts: sections.iter().map(|s| s.questions().len()).collect(),
                },
                sections
                    .iter()
                    .map(|s| s.questions().iter().map(Question::id).collect())
                    .collect(),
            ),
            TestDefinition::Writing { tasks, .. } => (
                Timing::PerTask {
                    budgets: [tasks[0].budget_seconds(), tasks[1].budget_seconds()],
                },
                NavShape::TwoTask,
                tasks.iter().map(|t| vec![t.id()]).collect(),
            ),
        };

        Self {
            module: definition.module(),
            mode,
            timing,
            shape,
            per_section,
        }
    }

    #[must_use]
    pub fn module(&self) -> ModuleKind {
        self.module
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    #[must_use]
    pub fn shape(&self) -> &NavShape {
        &self.shape
    }

    /// Listening is the only module with gated audio.
    #[must_use]
    pub fn has_playback(&self) -> bool {
        self.module == ModuleKind::Listening
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.per_section.len()
    }

    #[must_use]
    pub fn question_at(&self, position: Position) -> Option<QuestionId> {
        self.per_section
            .get(position.section)
            .and_then(|ids| ids.get(position.question))
            .copied()
    }

    #[must_use]
    pub fn contains(&self, question: QuestionId) -> bool {
        self.per_section
            .iter()
            .any(|ids| ids.contains(&question))
    }

    /// Question ids in presentation order.
    #[must_use]
    pub fn ordered_questions(&self) -> Vec<QuestionId> {
        self.per_section.iter().flatten().copied().collect()
    }

    #[must_use]
    pub fn total_budget_seconds(&self) -> u32 {
        match &self.timing {
            Timing::Single { budget_seconds } => *budget_seconds,
            Timing::PerTask { budgets } => budgets.iter().sum(),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        AssetRef, ListeningSection, QuestionType, SectionId, TaskNumber, TestId, WritingTask,
    };

    fn question(id: u64) -> Question {
        Question::new(QuestionId::new(id), QuestionType::FreeText, "Q", Vec::new()).unwrap()
    }

    #[test]
    fn reading_plans_are_flat_and_single_budget() {
        let def = TestDefinition::reading(
            TestId::new(1),
            "R",
            "passage",
            vec![question(1), question(2)],
        )
        .unwrap();
        let plan = SessionPlan::for_test(&def, TestMode::Exam);

        assert_eq!(plan.shape(), &NavShape::Flat { questions: 2 });
        assert_eq!(
            plan.timing(),
            &Timing::Single { budget_seconds: 3600 }
        );
        assert!(!plan.has_playback());
        assert!(plan.contains(QuestionId::new(2)));
        assert!(!plan.contains(QuestionId::new(9)));
    }

    #[test]
    fn listening_plans_mirror_section_structure() {
        let audio = AssetRef::parse("https://cdn.example.com/a.mp3").unwrap();
        let sections = vec![
            ListeningSection::new(
                SectionId::new(1),
                "S1",
                "i",
                audio.clone(),
                vec![question(1), question(2)],
            )
            .unwrap(),
            ListeningSection::new(SectionId::new(2), "S2", "i", audio, vec![question(3)])
                .unwrap(),
        ];
        let def = TestDefinition::listening(TestId::new(2), "L", sections).unwrap();
        let plan = SessionPlan::for_test(&def, TestMode::Practice);

        assert_eq!(
            plan.shape(),
            &NavShape::Sectioned {
                counts: vec![2, 1]
            }
        );
        assert!(plan.has_playback());
        assert_eq!(
            plan.question_at(Position {
                section: 1,
                question: 0
            }),
            Some(QuestionId::new(3))
        );
        assert_eq!(plan.question_at(Position { section: 2, question: 0 }), None);
    }

    #[test]
    fn writing_plans_split_the_budget_per_task() {
        let def = TestDefinition::writing(
            TestId::new(3),
            "W",
            [
                WritingTask::new(QuestionId::new(1), TaskNumber::One, "p1", None),
                WritingTask::new(QuestionId::new(2), TaskNumber::Two, "p2", None),
            ],
        );
        let plan = SessionPlan::for_test(&def, TestMode::Exam);

        assert_eq!(
            plan.timing(),
            &Timing::PerTask {
                budgets: [1200, 2400]
            }
        );
        assert_eq!(plan.shape(), &NavShape::TwoTask);
        assert_eq!(plan.total_budget_seconds(), 3600);
        assert_eq!(
            plan.ordered_questions(),
            vec![QuestionId::new(1), QuestionId::new(2)]
        );
    }
}
