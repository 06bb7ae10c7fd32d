// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{config::Config, error::AppError, exam::ExamSession};

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_ADMIN: &str = "admin";

/// Password reset tokens live this long.
const RESET_TOKEN_SECONDS: u64 = 15 * 60;
const RESET_PURPOSE: &str = "password_reset";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the Student ID (as string). "0" for the admin.
    pub sub: String,
    /// 'student' or 'admin'.
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn student_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Claims of an exam token. The whole navigation state rides in the token,
/// so the server keeps nothing between requests.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExamClaims {
    pub sub: String,
    /// Deadline plus grace, as Unix timestamp.
    pub exp: usize,
    pub session: ExamSession,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
struct ResetClaims {
    /// Email of the account being reset.
    sub: String,
    purpose: String,
    exp: usize,
}

fn now_secs() -> Result<u64, AppError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn verify<T: DeserializeOwned>(
    token: &str,
    secret: &str,
    validation: &Validation,
) -> Result<T, jsonwebtoken::errors::Error> {
    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), validation)
        .map(|data| data.claims)
}

/// Signs a new login JWT.
///
/// Arguments:
/// * `id`: Student ID, or 0 for the admin.
/// * `role`: `ROLE_STUDENT` or `ROLE_ADMIN`.
pub fn sign_jwt(id: i64, role: &str, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let claims = Claims {
        sub: id.to_string(),
        role: role.to_owned(),
        exp: (now_secs()? + expiration_seconds) as usize,
    };

    sign(&claims, secret)
}

/// Verifies and decodes a login JWT.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    verify(token, secret, &Validation::default())
        .map_err(|_| AppError::AuthError("Invalid token".to_string()))
}

/// Signs the exam token for `session`. Returns the token and the seconds
/// until the exam's deadline.
pub fn sign_exam_token(
    session: &ExamSession,
    secret: &str,
    grace_seconds: i64,
) -> Result<(String, i64), AppError> {
    let now = now_secs()? as i64;
    let claims = ExamClaims {
        sub: session.student_id.to_string(),
        exp: (session.deadline() + grace_seconds).max(0) as usize,
        session: session.clone(),
    };

    Ok((sign(&claims, secret)?, session.remaining_seconds(now)))
}

/// Decodes an exam token without checking expiry: an overdue session must
/// still be readable so it can be force-finished.
pub fn verify_exam_token(token: &str, secret: &str) -> Result<ExamSession, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = false;

    verify::<ExamClaims>(token, secret, &validation)
        .map(|claims| claims.session)
        .map_err(|_| AppError::NoActiveExam)
}

pub fn sign_reset_token(email: &str, secret: &str) -> Result<String, AppError> {
    let claims = ResetClaims {
        sub: email.to_owned(),
        purpose: RESET_PURPOSE.to_owned(),
        exp: (now_secs()? + RESET_TOKEN_SECONDS) as usize,
    };

    sign(&claims, secret)
}

/// Returns the email the reset token was issued for.
pub fn verify_reset_token(token: &str, secret: &str) -> Result<String, AppError> {
    let claims: ResetClaims = verify(token, secret, &Validation::default())
        .map_err(|_| AppError::AuthError("Invalid or expired reset token".to_string()))?;

    if claims.purpose != RESET_PURPOSE {
        return Err(AppError::AuthError("Invalid or expired reset token".to_string()));
    }

    Ok(claims.sub)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Axum Middleware: Student Authorization.
///
/// Must be used AFTER `auth_middleware`. Exam and dashboard routes belong to students.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, ROLE_STUDENT)?;
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks if the injected `Claims` has 'admin' role.
/// If not, returns 403 Forbidden.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, ROLE_ADMIN)?;
    Ok(next.run(req).await)
}

fn require_role(req: &Request<Body>, role: &str) -> Result<(), StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if claims.role != role {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(())
}
