// src/exam/store.rs

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        exam::{AnswerDetail, ExamAnswer, ExamResult},
        question::Question,
        subject::Subject,
    },
};

/// Persistence the exam engine depends on.
///
/// `record_answer` and `finalize_result` must each apply their counter and
/// row changes atomically, and both must refuse to mutate a finalized result.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, AppError>;

    /// Ids of every question in the subject's bank.
    async fn question_ids_for_subject(&self, subject_id: i64) -> Result<Vec<i64>, AppError>;

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Inserts a fresh attempt with zero counters and score.
    async fn create_result(
        &self,
        student_id: i64,
        subject_id: i64,
        total_questions: i32,
    ) -> Result<ExamResult, AppError>;

    async fn find_result(&self, id: i64) -> Result<Option<ExamResult>, AppError>;

    /// Upserts the answer for `(result_id, question_id)` and moves the result's
    /// counters by `scoring::tally_delta`. Returns the updated result.
    async fn record_answer(
        &self,
        result_id: i64,
        question_id: i64,
        selected: &str,
        is_correct: bool,
    ) -> Result<ExamResult, AppError>;

    /// Applies `scoring::finalize_tally` and stamps `finalized_at`.
    /// A result that is already finalized is returned unchanged.
    async fn finalize_result(&self, result_id: i64) -> Result<ExamResult, AppError>;

    async fn answers_for_result(&self, result_id: i64) -> Result<Vec<ExamAnswer>, AppError>;

    async fn answer_details(&self, result_id: i64) -> Result<Vec<AnswerDetail>, AppError>;
}
