// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        grade::is_student_grade,
        student::{
            ForgotPasswordRequest, LoginRequest, RegisterStudentRequest, ResetPasswordRequest,
            Student,
        },
    },
    utils::{
        credentials::CredentialCheck,
        jwt::{ROLE_ADMIN, ROLE_STUDENT, sign_jwt, sign_reset_token, verify_reset_token},
    },
};

const STUDENT_COLUMNS: &str = "id, full_name, email, password, grade, created_at";

/// Registers a new student.
///
/// The grade must be one of the known labels and the email must be unused.
/// Returns 201 Created and the student object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    State(credentials): State<Arc<dyn CredentialCheck>>,
    Json(payload): Json<RegisterStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if !is_student_grade(&payload.grade) {
        return Err(AppError::BadRequest("Unknown grade".to_string()));
    }

    let stored_password = credentials.protect(&payload.password)?;

    let student = sqlx::query_as::<_, Student>(&format!(
        r#"
        INSERT INTO students (full_name, email, password, grade)
        VALUES ($1, $2, $3, $4)
        RETURNING {STUDENT_COLUMNS}
        "#
    ))
    .bind(payload.full_name.trim())
    .bind(payload.email.trim())
    .bind(&stored_password)
    .bind(&payload.grade)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Email '{}' is already registered", payload.email))
        } else {
            tracing::error!("Failed to register student: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!("Student registered: id={}", student.id);

    Ok((StatusCode::CREATED, Json(student)))
}

/// Authenticates a student and returns a JWT token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(credentials): State<Arc<dyn CredentialCheck>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = find_by_email(&pool, payload.email.trim())
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !credentials.verify(&payload.password, &student.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(
        student.id,
        ROLE_STUDENT,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "student": student
    })))
}

/// Authenticates the administrator configured through `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
pub async fn admin_login(
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Err(AppError::AuthError("Admin login is disabled".to_string()));
    };

    if payload.email != *email || payload.password != *password {
        tracing::warn!("Failed admin login attempt");
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(0, ROLE_ADMIN, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer"
    })))
}

/// First step of a password reset: returns a short-lived reset token when
/// the email belongs to a student.
pub async fn forgot_password(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = find_by_email(&pool, payload.email.trim())
        .await?
        .ok_or(AppError::NotFound("Email not found".to_string()))?;

    let reset_token = sign_reset_token(&student.email, &config.jwt_secret)?;

    Ok(Json(json!({ "reset_token": reset_token })))
}

/// Second step of a password reset: stores the new password.
pub async fn reset_password(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(credentials): State<Arc<dyn CredentialCheck>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = verify_reset_token(&payload.reset_token, &config.jwt_secret)?;
    let stored_password = credentials.protect(&payload.password)?;

    let updated = sqlx::query("UPDATE students SET password = $1 WHERE email = $2")
        .bind(&stored_password)
        .bind(&email)
        .execute(&pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("Email not found".to_string()));
    }

    Ok(StatusCode::OK)
}

async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Student>, AppError> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Student lookup failed: {:?}", e);
        AppError::from(e)
    })
}
