// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    import::{parse_sheet, read_workbook},
    models::{
        exam::ResultSummary,
        grade::all_grade_keys,
        question::{Question, QuestionRequest},
        student::StudentSummary,
        subject::{Subject, SubjectRequest},
    },
    utils::html::clean_html,
};

const SUBJECT_COLUMNS: &str = "id, name, grade, default_duration, default_questions";
const QUESTION_COLUMNS: &str =
    "id, subject_id, text, option1, option2, option3, option4, correct_option";

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub students: i64,
    pub subjects: i64,
    pub questions: i64,
    pub results: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub stats: DashboardStats,
    pub recent: Vec<ResultSummary>,
}

/// Row counts plus the five latest attempts.
pub async fn dashboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let (students, subjects, questions, results) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM students),
            (SELECT COUNT(*) FROM subjects),
            (SELECT COUNT(*) FROM questions),
            (SELECT COUNT(*) FROM exam_results)
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let recent = fetch_result_summaries(&pool, Some(5)).await?;

    Ok(Json(AdminDashboard {
        stats: DashboardStats {
            students,
            subjects,
            questions,
            results,
        },
        recent,
    }))
}

// ---------- Subjects ----------

/// Every valid grade key, for the subject form.
pub async fn list_grade_keys() -> impl IntoResponse {
    Json(all_grade_keys())
}

pub async fn list_subjects(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(&format!(
        "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY grade, name"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(subjects))
}

pub async fn create_subject(
    State(pool): State<PgPool>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let subject = sqlx::query_as::<_, Subject>(&format!(
        r#"
        INSERT INTO subjects (name, grade, default_duration, default_questions)
        VALUES ($1, $2, $3, $4)
        RETURNING {SUBJECT_COLUMNS}
        "#
    ))
    .bind(payload.name.trim())
    .bind(&payload.grade)
    .bind(payload.duration)
    .bind(payload.questions)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create subject: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn update_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let subject = sqlx::query_as::<_, Subject>(&format!(
        r#"
        UPDATE subjects
        SET name = $1, grade = $2, default_duration = $3, default_questions = $4
        WHERE id = $5
        RETURNING {SUBJECT_COLUMNS}
        "#
    ))
    .bind(payload.name.trim())
    .bind(&payload.grade)
    .bind(payload.duration)
    .bind(payload.questions)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Deletes a subject. Its questions, results and answers go with it (FK cascade).
pub async fn delete_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject {}: {:?}", id, e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------- Questions ----------

pub async fn list_questions(
    State(pool): State<PgPool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_subject(&pool, subject_id).await?;

    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE subject_id = $1 ORDER BY id"
    ))
    .bind(subject_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(questions))
}

pub async fn create_question(
    State(pool): State<PgPool>,
    Path(subject_id): Path<i64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_subject(&pool, subject_id).await?;

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions (subject_id, text, option1, option2, option3, option4, correct_option)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(subject_id)
    .bind(clean_html(&payload.text))
    .bind(clean_html(&payload.option1))
    .bind(clean_html(&payload.option2))
    .bind(clean_html(&payload.option3))
    .bind(clean_html(&payload.option4))
    .bind(&payload.correct_option)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn get_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Replaces a question. Answers already recorded keep their stored correctness.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        UPDATE questions
        SET text = $1, option1 = $2, option2 = $3, option3 = $4, option4 = $5, correct_option = $6
        WHERE id = $7
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(clean_html(&payload.text))
    .bind(clean_html(&payload.option1))
    .bind(clean_html(&payload.option2))
    .bind(clean_html(&payload.option3))
    .bind(clean_html(&payload.option4))
    .bind(&payload.correct_option)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Bulk-imports questions from an uploaded `.xlsx` workbook.
///
/// Expects a multipart form with `subject_id` and `file`. All rows are
/// inserted in one transaction; any failure rolls back the whole file and is
/// reported as a single `ImportFailed`.
pub async fn import_questions(
    State(pool): State<PgPool>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut subject_id: Option<i64> = None;
    let mut file: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("failed to read multipart field: {e}");
        AppError::ImportFailed(e.to_string())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "subject_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::ImportFailed(e.to_string()))?;
                subject_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| AppError::ImportFailed(format!("bad subject_id '{text}'")))?,
                );
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::ImportFailed(e.to_string()))?;
                file = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let subject_id =
        subject_id.ok_or(AppError::ImportFailed("missing subject_id field".to_string()))?;
    let file = file.ok_or(AppError::ImportFailed("missing file field".to_string()))?;

    let questions = parse_sheet(&read_workbook(&file)?)?;
    ensure_subject(&pool, subject_id).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::ImportFailed(e.to_string()))?;

    for q in &questions {
        let [option1, option2, option3, option4] = &q.options;
        sqlx::query(
            r#"
            INSERT INTO questions (subject_id, text, option1, option2, option3, option4, correct_option)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subject_id)
        .bind(clean_html(&q.text))
        .bind(clean_html(option1))
        .bind(clean_html(option2))
        .bind(clean_html(option3))
        .bind(clean_html(option4))
        .bind(&q.correct_option)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::ImportFailed(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::ImportFailed(e.to_string()))?;

    tracing::info!(
        "Imported {} questions into subject {}",
        questions.len(),
        subject_id
    );

    Ok(Json(serde_json::json!({ "imported": questions.len() })))
}

// ---------- Students ----------

pub async fn list_students(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, StudentSummary>(
        "SELECT id, full_name, email, grade, created_at FROM students ORDER BY full_name",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(students))
}

/// Deletes a student along with their results and answers (FK cascade).
pub async fn delete_student(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------- Results ----------

pub async fn list_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_result_summaries(&pool, None).await?))
}

pub async fn delete_result(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_results WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam result not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_result_summaries(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<ResultSummary>, AppError> {
    let summaries = sqlx::query_as::<_, ResultSummary>(
        r#"
        SELECT r.id, st.full_name as student_name, s.name as subject_name, r.score, r.created_at
        FROM exam_results r
        JOIN students st ON r.student_id = st.id
        JOIN subjects s ON r.subject_id = s.id
        ORDER BY r.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exam results: {:?}", e);
        AppError::from(e)
    })?;

    Ok(summaries)
}

async fn ensure_subject(pool: &PgPool, subject_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = $1")
        .bind(subject_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(())
}
