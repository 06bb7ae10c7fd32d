// src/exam/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::AppError,
    exam::{
        scoring::{finalize_tally, tally_delta},
        store::ExamStore,
    },
    models::{
        exam::{AnswerDetail, ExamAnswer, ExamResult},
        question::Question,
        subject::Subject,
    },
};

const RESULT_COLUMNS: &str = "id, student_id, subject_id, score, correct_count, wrong_count, \
     total_questions, created_at, finalized_at";

/// `ExamStore` backed by the application's Postgres pool.
#[derive(Clone)]
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the result row for the rest of the transaction.
    async fn lock_result(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        result_id: i64,
    ) -> Result<ExamResult, AppError> {
        sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM exam_results WHERE id = $1 FOR UPDATE"
        ))
        .bind(result_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NotFound("Exam result not found".to_string()))
    }
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, name, grade, default_duration, default_questions FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    async fn question_ids_for_subject(&self, subject_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM questions WHERE subject_id = $1 ORDER BY id",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, subject_id, text, option1, option2, option3, option4, correct_option
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn create_result(
        &self,
        student_id: i64,
        subject_id: i64,
        total_questions: i32,
    ) -> Result<ExamResult, AppError> {
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            r#"
            INSERT INTO exam_results (student_id, subject_id, score, correct_count, wrong_count, total_questions)
            VALUES ($1, $2, 0, 0, 0, $3)
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(subject_id)
        .bind(total_questions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create exam result: {:?}", e);
            AppError::from(e)
        })?;

        Ok(result)
    }

    async fn find_result(&self, id: i64) -> Result<Option<ExamResult>, AppError> {
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM exam_results WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn record_answer(
        &self,
        result_id: i64,
        question_id: i64,
        selected: &str,
        is_correct: bool,
    ) -> Result<ExamResult, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Serialize writers on this attempt
        let result = Self::lock_result(&mut tx, result_id).await?;
        if result.is_finalized() {
            return Err(AppError::NoActiveExam);
        }

        // 2. Previous correctness, if the question was already answered
        let previous = sqlx::query_scalar::<_, bool>(
            "SELECT is_correct FROM exam_answers WHERE result_id = $1 AND question_id = $2",
        )
        .bind(result_id)
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?;

        // 3. Upsert on the (result_id, question_id) key
        sqlx::query(
            r#"
            INSERT INTO exam_answers (result_id, question_id, student_answer, is_correct)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (result_id, question_id) DO UPDATE SET
                student_answer = EXCLUDED.student_answer,
                is_correct = EXCLUDED.is_correct
            "#,
        )
        .bind(result_id)
        .bind(question_id)
        .bind(selected)
        .bind(is_correct)
        .execute(&mut *tx)
        .await?;

        // 4. Move counters in the same transaction
        let (correct_delta, wrong_delta) = tally_delta(previous, is_correct);
        let updated = sqlx::query_as::<_, ExamResult>(&format!(
            r#"
            UPDATE exam_results
            SET correct_count = correct_count + $2, wrong_count = wrong_count + $3
            WHERE id = $1
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(result_id)
        .bind(correct_delta)
        .bind(wrong_delta)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn finalize_result(&self, result_id: i64) -> Result<ExamResult, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = Self::lock_result(&mut tx, result_id).await?;
        if result.is_finalized() {
            tx.commit().await?;
            return Ok(result);
        }

        let tally = finalize_tally(
            result.correct_count,
            result.wrong_count,
            result.total_questions,
        );

        let finalized = sqlx::query_as::<_, ExamResult>(&format!(
            r#"
            UPDATE exam_results
            SET correct_count = $2, wrong_count = $3, score = $4, finalized_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(result_id)
        .bind(tally.correct_count)
        .bind(tally.wrong_count)
        .bind(tally.score)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(finalized)
    }

    async fn answers_for_result(&self, result_id: i64) -> Result<Vec<ExamAnswer>, AppError> {
        let answers = sqlx::query_as::<_, ExamAnswer>(
            r#"
            SELECT id, result_id, question_id, student_answer, is_correct
            FROM exam_answers
            WHERE result_id = $1
            ORDER BY id
            "#,
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    async fn answer_details(&self, result_id: i64) -> Result<Vec<AnswerDetail>, AppError> {
        let details = sqlx::query_as::<_, AnswerDetail>(
            r#"
            SELECT
                q.id as question_id, q.text, q.option1, q.option2, q.option3, q.option4,
                q.correct_option, a.student_answer, a.is_correct
            FROM exam_answers a
            JOIN questions q ON a.question_id = q.id
            WHERE a.result_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }
}
