use std::env;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use async_trait::async_trait;
use exam_core::model::{
    AnswerValue, AssetRef, AttemptId, AttemptSubmission, BandScore, ListeningSection, ModuleKind,
    Question, QuestionId, QuestionReview, QuestionType, ResultId, ResultSummary, SectionId,
    TaskFeedback, TaskNumber, TestDefinition, TestId, TestMode, WritingTask,
};

use super::{ExamApi, FetchedTest};
use crate::error::ApiError;

/// Answer-sheet keys for the two writing tasks. The writing endpoints key
/// responses by task rather than by question, so the client fixes these.
fn task_key(number: TaskNumber) -> QuestionId {
    QuestionId::new(number.index() as u64 + 1)
}

#[derive(Clone, Debug)]
pub struct HttpExamApiConfig {
    pub base_url: String,
}

impl HttpExamApiConfig {
    /// Read `EXAM_API_URL`, falling back to the local dev server.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            env::var("EXAM_API_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        Self { base_url }
    }
}

/// `reqwest`-backed exam API speaking the portal's historical endpoints.
#[derive(Clone)]
pub struct HttpExamApi {
    client: Client,
    base_url: String,
}

impl HttpExamApi {
    #[must_use]
    pub fn new(config: HttpExamApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HttpExamApiConfig::from_env())
    }

    fn test_url(&self, module: ModuleKind, id: TestId) -> String {
        match module {
            ModuleKind::Reading => format!("{}/api/tests/{}/", self.base_url, id),
            ModuleKind::Listening => format!("{}/api/listening-tests/{}/", self.base_url, id),
            ModuleKind::Writing => format!("{}/api/writing-tests/{}/", self.base_url, id),
        }
    }

    fn submit_url(&self, module: ModuleKind, id: TestId) -> String {
        format!("{}submit/", self.test_url(module, id))
    }

    fn result_url(&self, module: ModuleKind, id: ResultId) -> String {
        match module {
            ModuleKind::Reading => format!("{}/api/results/{}/", self.base_url, id),
            ModuleKind::Listening => format!("{}/api/listening-results/{}/", self.base_url, id),
            ModuleKind::Writing => format!("{}/api/writing-results/{}/", self.base_url, id),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: &Value,
    ) -> Result<T, ApiError> {
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ExamApi for HttpExamApi {
    async fn fetch_test(&self, module: ModuleKind, id: TestId) -> Result<FetchedTest, ApiError> {
        let url = self.test_url(module, id);
        match module {
            ModuleKind::Reading => {
                let dto: ReadingTestDto = self.get_json(url).await?;
                dto.into_fetched()
            }
            ModuleKind::Listening => {
                let dto: ListeningTestDto = self.get_json(url).await?;
                dto.into_fetched()
            }
            ModuleKind::Writing => {
                let dto: WritingTestDto = self.get_json(url).await?;
                dto.into_fetched()
            }
        }
    }

    async fn submit_attempt(&self, submission: &AttemptSubmission) -> Result<ResultId, ApiError> {
        let url = self.submit_url(submission.module(), submission.test_id());
        let body = submit_body(submission)?;
        match submission.module() {
            ModuleKind::Reading => {
                let dto: ReadingSubmitResponse = self.post_json(url, &body).await?;
                Ok(ResultId::new(dto.result.id))
            }
            ModuleKind::Listening => {
                let dto: ListeningSubmitResponse = self.post_json(url, &body).await?;
                Ok(ResultId::new(dto.result_id))
            }
            ModuleKind::Writing => {
                let dto: WritingSubmitResponse = self.post_json(url, &body).await?;
                Ok(ResultId::new(dto.submission_id))
            }
        }
    }

    async fn fetch_result(&self, module: ModuleKind, id: ResultId) -> Result<ResultSummary, ApiError> {
        let dto: ResultDto = self.get_json(self.result_url(module, id)).await?;
        dto.into_summary(module)
    }
}

//
// ─── REQUEST BODIES ────────────────────────────────────────────────────────────
//

fn submit_body(submission: &AttemptSubmission) -> Result<Value, ApiError> {
    match submission.module() {
        ModuleKind::Reading | ModuleKind::Listening => {
            let mut answers = Map::new();
            for (question_id, value) in submission.answers() {
                answers.insert(
                    question_id.to_string(),
                    serde_json::to_value(value)
                        .map_err(|e| ApiError::Decode(e.to_string()))?,
                );
            }
            Ok(json!({
                "answers": answers,
                "time_taken": submission.elapsed_seconds(),
                "mode": submission.mode().as_str(),
            }))
        }
        ModuleKind::Writing => {
            let timings = submission
                .task_timings()
                .ok_or_else(|| ApiError::Decode("writing submission without timings".into()))?;
            Ok(json!({
                "task1_answer": writing_answer(submission, TaskNumber::One),
                "task2_answer": writing_answer(submission, TaskNumber::Two),
                "task1_time_taken": hms(timings[0].elapsed_seconds),
                "task2_time_taken": hms(timings[1].elapsed_seconds),
                "mode": submission.mode().as_str(),
            }))
        }
    }
}

fn writing_answer(submission: &AttemptSubmission, number: TaskNumber) -> String {
    match submission.answer(task_key(number)) {
        Some(AnswerValue::Text(s) | AnswerValue::Choice(s)) => s.clone(),
        Some(AnswerValue::Choices(items)) => items.join(" "),
        None => String::new(),
    }
}

fn hms(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

//
// ─── RESPONSE DTOS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct QuestionDto {
    id: u64,
    question_type: String,
    question_text: String,
    #[serde(default)]
    choices: Vec<String>,
}

impl QuestionDto {
    fn into_question(self) -> Result<Question, ApiError> {
        let question_type = QuestionType::parse_wire(&self.question_type)?;
        Ok(Question::new(
            QuestionId::new(self.id),
            question_type,
            self.question_text,
            self.choices,
        )?)
    }
}

#[derive(Debug, Deserialize)]
struct ReadingTestDto {
    id: u64,
    title: String,
    passage: String,
    attempt_id: uuid::Uuid,
    questions: Vec<QuestionDto>,
}

impl ReadingTestDto {
    fn into_fetched(self) -> Result<FetchedTest, ApiError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        let definition =
            TestDefinition::reading(TestId::new(self.id), self.title, self.passage, questions)?;
        Ok(FetchedTest {
            attempt_id: AttemptId::new(self.attempt_id),
            definition,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListeningSectionDto {
    id: u64,
    title: String,
    instructions: String,
    audio_file: String,
    questions: Vec<QuestionDto>,
}

impl ListeningSectionDto {
    fn into_section(self) -> Result<ListeningSection, ApiError> {
        let audio = AssetRef::parse(&self.audio_file)?;
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListeningSection::new(
            SectionId::new(self.id),
            self.title,
            self.instructions,
            audio,
            questions,
        )?)
    }
}

#[derive(Debug, Deserialize)]
struct ListeningTestDto {
    id: u64,
    title: String,
    attempt_id: uuid::Uuid,
    sections: Vec<ListeningSectionDto>,
}

impl ListeningTestDto {
    fn into_fetched(self) -> Result<FetchedTest, ApiError> {
        let sections = self
            .sections
            .into_iter()
            .map(ListeningSectionDto::into_section)
            .collect::<Result<Vec<_>, _>>()?;
        let definition = TestDefinition::listening(TestId::new(self.id), self.title, sections)?;
        Ok(FetchedTest {
            attempt_id: AttemptId::new(self.attempt_id),
            definition,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WritingTestDto {
    id: u64,
    title: String,
    attempt_id: uuid::Uuid,
    task1_prompt: String,
    #[serde(default)]
    task1_image: Option<String>,
    task2_essay_prompt: String,
}

impl WritingTestDto {
    fn into_fetched(self) -> Result<FetchedTest, ApiError> {
        let chart = match self.task1_image.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(AssetRef::parse(raw)?),
            _ => None,
        };
        let tasks = [
            WritingTask::new(task_key(TaskNumber::One), TaskNumber::One, self.task1_prompt, chart),
            WritingTask::new(
                task_key(TaskNumber::Two),
                TaskNumber::Two,
                self.task2_essay_prompt,
                None,
            ),
        ];
        let definition = TestDefinition::writing(TestId::new(self.id), self.title, tasks);
        Ok(FetchedTest {
            attempt_id: AttemptId::new(self.attempt_id),
            definition,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReadingSubmitResponse {
    result: ReadingSubmitResult,
}

#[derive(Debug, Deserialize)]
struct ReadingSubmitResult {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct ListeningSubmitResponse {
    result_id: u64,
}

#[derive(Debug, Deserialize)]
struct WritingSubmitResponse {
    submission_id: u64,
}

#[derive(Debug, Deserialize)]
struct ReviewRowDto {
    question_id: u64,
    question_text: String,
    #[serde(default)]
    user_answer: Option<AnswerValue>,
    correct_answer: String,
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct TaskFeedbackDto {
    task_number: u8,
    band: f32,
    feedback: String,
    word_count: usize,
}

#[derive(Debug, Deserialize)]
struct ResultDto {
    id: u64,
    test: u64,
    #[serde(default = "default_mode")]
    mode: String,
    score: f32,
    correct_count: u32,
    total_questions: u32,
    time_taken: u32,
    completed_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    details: Vec<ReviewRowDto>,
    #[serde(default)]
    tasks: Vec<TaskFeedbackDto>,
}

fn default_mode() -> String {
    "exam".into()
}

impl ResultDto {
    fn into_summary(self, module: ModuleKind) -> Result<ResultSummary, ApiError> {
        let mode: TestMode = self
            .mode
            .parse()
            .map_err(|_| ApiError::Decode(format!("unknown mode {}", self.mode)))?;
        let reviews = self
            .details
            .into_iter()
            .map(|row| QuestionReview {
                question_id: QuestionId::new(row.question_id),
                prompt: row.question_text,
                given: row.user_answer,
                expected: row.correct_answer,
                is_correct: row.is_correct,
            })
            .collect();
        let task_feedback = self
            .tasks
            .into_iter()
            .map(|task| {
                Ok(TaskFeedback {
                    number: if task.task_number <= 1 {
                        TaskNumber::One
                    } else {
                        TaskNumber::Two
                    },
                    band: band_from_raw(task.band)?,
                    feedback: task.feedback,
                    word_count: task.word_count,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(ResultSummary::from_scored(
            ResultId::new(self.id),
            TestId::new(self.test),
            module,
            mode,
            band_from_raw(self.score)?,
            self.correct_count,
            self.total_questions,
            self.time_taken,
            self.completed_at,
            reviews,
            task_feedback,
        )?)
    }
}

/// The server reports raw `correct/total * 9.0` floats; the exam reports
/// bands on half steps, so snap to the nearest half band for display.
fn band_from_raw(raw: f32) -> Result<BandScore, ApiError> {
    let snapped = (raw.clamp(0.0, 9.0) * 2.0).round() / 2.0;
    Ok(BandScore::from_value(snapped)?)
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
