// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,

    pub full_name: String,

    /// Unique login email.
    pub email: String,

    /// Stored credential, as produced by the configured `CredentialCheck`.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// One of `STUDENT_GRADES`.
    pub grade: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for student self-registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterStudentRequest {
    #[validate(length(min = 1, max = 120, message = "Full name is required."))]
    pub full_name: String,
    #[validate(email(message = "A valid email is required."), length(max = 120))]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub grade: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for student and admin login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 120))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, max = 120))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    #[validate(length(min = 4, max = 128))]
    pub password: String,
}

/// One finished or in-progress attempt on the student dashboard.
#[derive(Debug, Serialize, FromRow)]
pub struct HistoryEntry {
    pub result_id: i64,
    pub subject_name: String,
    pub score: f64,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub student: Student,
    pub total_exams: usize,
    pub total_correct: i64,
    pub total_wrong: i64,
    pub results: Vec<HistoryEntry>,
}

/// Admin listing row.
#[derive(Debug, Serialize, FromRow)]
pub struct StudentSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub grade: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
