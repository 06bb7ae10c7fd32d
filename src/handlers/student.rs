// src/handlers/student.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        grade::{GradeChoices, LEVEL_CHOICES, SEMESTER_CHOICES, TRACK_CHOICES, build_grade_key},
        student::{DashboardResponse, HistoryEntry, Student},
        subject::{Subject, SubjectFilter},
    },
    utils::jwt::Claims,
};

/// Levels, tracks and semesters a student picks from before listing subjects.
pub async fn grade_choices() -> impl IntoResponse {
    Json(GradeChoices::all())
}

/// Lists subjects for the chosen level/track/semester.
///
/// Without any filter every subject is listed, grouped by grade key.
pub async fn list_subjects(
    State(pool): State<PgPool>,
    Query(filter): Query<SubjectFilter>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = match (&filter.level, &filter.track, &filter.semester) {
        (None, None, None) => {
            sqlx::query_as::<_, Subject>(
                "SELECT id, name, grade, default_duration, default_questions FROM subjects ORDER BY grade, name",
            )
            .fetch_all(&pool)
            .await?
        }
        (Some(level), Some(track), Some(semester)) => {
            if !LEVEL_CHOICES.contains(&level.as_str())
                || !TRACK_CHOICES.contains(&track.as_str())
                || !SEMESTER_CHOICES.contains(&semester.as_str())
            {
                return Err(AppError::BadRequest(
                    "Unknown level, track or semester".to_string(),
                ));
            }

            let grade_key = build_grade_key(level, track, semester);
            sqlx::query_as::<_, Subject>(
                "SELECT id, name, grade, default_duration, default_questions FROM subjects WHERE grade = $1 ORDER BY name",
            )
            .bind(&grade_key)
            .fetch_all(&pool)
            .await?
        }
        _ => {
            return Err(AppError::BadRequest(
                "Choose the level, track and semester".to_string(),
            ));
        }
    };

    Ok(Json(subjects))
}

/// The student's exam history, newest first, with running totals.
pub async fn dashboard(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.student_id()?;

    let student = sqlx::query_as::<_, Student>(
        "SELECT id, full_name, email, password, grade, created_at FROM students WHERE id = $1",
    )
    .bind(student_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Student not found".to_string()))?;

    let results = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT
            r.id as result_id, s.name as subject_name, r.score,
            r.correct_count, r.wrong_count, r.created_at
        FROM exam_results r
        JOIN subjects s ON r.subject_id = s.id
        WHERE r.student_id = $1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch exam history: {:?}", e);
        AppError::from(e)
    })?;

    let total_correct = results.iter().map(|r| i64::from(r.correct_count)).sum();
    let total_wrong = results.iter().map(|r| i64::from(r.wrong_count)).sum();

    Ok(Json(DashboardResponse {
        student,
        total_exams: results.len(),
        total_correct,
        total_wrong,
        results,
    }))
}
