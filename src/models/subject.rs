// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const DEFAULT_DURATION_MINUTES: i32 = 40;
pub const DEFAULT_QUESTION_COUNT: i32 = 40;

/// Represents the 'subjects' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,

    /// Composite grade key, see `grade::build_grade_key`.
    pub grade: String,

    /// Exam duration in minutes.
    pub default_duration: i32,

    /// How many questions are drawn per attempt.
    pub default_questions: i32,
}

/// DTO for creating or replacing a subject.
#[derive(Debug, Deserialize, Validate)]
pub struct SubjectRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(custom(function = validate_grade_key))]
    pub grade: String,
    #[validate(range(min = 1, message = "Duration must be a positive number of minutes."))]
    pub duration: i32,
    #[validate(range(min = 1, message = "Question count must be positive."))]
    pub questions: i32,
}

fn validate_grade_key(key: &str) -> Result<(), validator::ValidationError> {
    if !crate::models::grade::is_grade_key(key) {
        return Err(validator::ValidationError::new("unknown_grade_key"));
    }
    Ok(())
}

/// Query for the student subject list.
#[derive(Debug, Deserialize)]
pub struct SubjectFilter {
    pub level: Option<String>,
    pub track: Option<String>,
    pub semester: Option<String>,
}
