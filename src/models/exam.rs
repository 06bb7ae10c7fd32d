// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::PublicQuestion;

/// Represents the 'exam_results' table in the database.
/// One row per attempt; counters move while the attempt is in progress.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub score: f64,
    pub correct_count: i32,
    pub wrong_count: i32,
    /// Size of the question set drawn for this attempt.
    pub total_questions: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Set once, by finalization.
    pub finalized_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ExamResult {
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }
}

/// Represents the 'exam_answers' table. Unique per (result_id, question_id).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ExamAnswer {
    pub id: i64,
    pub result_id: i64,
    pub question_id: i64,
    pub student_answer: String,
    pub is_correct: bool,
}

/// An answer joined with the question it was given for, for the result page.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub text: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub correct_option: String,
    pub student_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultDetail {
    pub result: ExamResult,
    pub answers: Vec<AnswerDetail>,
}

/// What the student does after (optionally) answering the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamAction {
    #[default]
    #[serde(alias = "next")]
    Continue,
    Finish,
}

/// A submission for one question.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    /// "1" to "4"; absent when the student only navigates.
    pub answer: Option<String>,
    #[serde(default)]
    pub action: ExamAction,
    /// Position of the question being answered, as the client saw it.
    pub current_index: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct JumpQuery {
    pub index: Option<String>,
}

/// Returned when an attempt starts or moves to another question.
#[derive(Debug, Serialize)]
pub struct ExamTokenResponse {
    pub exam_token: String,
    pub result_id: i64,
    pub index: usize,
    pub total_questions: usize,
    pub expires_in: i64,
}

/// Answer of every exam route that can move the attempt along.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExamStepResponse {
    /// New exam token; the client must send it on the next request.
    InProgress(ExamTokenResponse),
    Question(QuestionView),
    /// The attempt is over and the exam token is dead.
    Finalized(ExamResult),
}

/// The question currently on screen.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub question: PublicQuestion,
    pub index: usize,
    pub total_questions: usize,
    pub duration_minutes: i32,
    pub remaining_seconds: i64,
    /// The student's saved selection for this question, if any.
    pub saved_answer: Option<u8>,
    /// Positions (not question ids) that already have an answer.
    pub answered: Vec<usize>,
}

/// Admin listing row.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultSummary {
    pub id: i64,
    pub student_name: String,
    pub subject_name: String,
    pub score: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
