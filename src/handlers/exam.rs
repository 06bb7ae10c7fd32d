// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::Config,
    error::AppError,
    exam::{ExamEngine, ExamSession, ExamStep, session::parse_index},
    models::exam::{ExamStepResponse, ExamTokenResponse, JumpQuery, SubmitAnswerRequest},
    utils::jwt::{Claims, sign_exam_token, verify_exam_token},
};

/// Header carrying the exam token between requests.
pub const EXAM_TOKEN_HEADER: &str = "x-exam-token";

/// Reads the exam token and checks it belongs to the logged-in student.
/// A missing, forged or foreign token means there is no active exam.
fn session_from_headers(
    headers: &HeaderMap,
    claims: &Claims,
    config: &Config,
) -> Result<ExamSession, AppError> {
    let token = headers
        .get(EXAM_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::NoActiveExam)?;

    let session = verify_exam_token(token, &config.jwt_secret)?;
    if session.student_id != claims.student_id()? {
        return Err(AppError::NoActiveExam);
    }

    Ok(session)
}

fn in_progress(session: &ExamSession, config: &Config) -> Result<ExamStepResponse, AppError> {
    let (exam_token, expires_in) =
        sign_exam_token(session, &config.jwt_secret, config.exam_grace_seconds)?;

    Ok(ExamStepResponse::InProgress(ExamTokenResponse {
        exam_token,
        result_id: session.result_id,
        index: session.index,
        total_questions: session.len(),
        expires_in,
    }))
}

fn is_overdue(session: &ExamSession, config: &Config) -> bool {
    session.is_overdue(Utc::now().timestamp(), config.exam_grace_seconds)
}

/// Starts an attempt on a subject and hands out its exam token.
pub async fn start_exam(
    State(engine): State<ExamEngine>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.student_id()?;
    let mut rng = StdRng::from_entropy();

    let session = engine
        .start(subject_id, student_id, &mut rng, Utc::now())
        .await?;

    Ok(Json(in_progress(&session, &config)?))
}

/// The question on screen. An attempt past its deadline is finalized instead.
pub async fn current_question(
    State(engine): State<ExamEngine>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let session = session_from_headers(&headers, &claims, &config)?;

    if is_overdue(&session, &config) {
        let result = engine.force_finish(&session).await?;
        return Ok(Json(ExamStepResponse::Finalized(result)));
    }

    let view = engine.current_question(&session, Utc::now()).await?;
    Ok(Json(ExamStepResponse::Question(view)))
}

/// Jumps to a question number. Out-of-range or unparsable input is clamped.
/// An attempt past its deadline is finalized instead.
pub async fn jump_to_index(
    State(engine): State<ExamEngine>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Query(query): Query<JumpQuery>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_from_headers(&headers, &claims, &config)?;

    if is_overdue(&session, &config) {
        let result = engine.force_finish(&session).await?;
        return Ok(Json(ExamStepResponse::Finalized(result)));
    }

    let requested = query.index.as_deref().map_or(session.index as i64, parse_index);
    let moved = engine.jump_to_index(&session, requested).await?;

    Ok(Json(in_progress(&moved, &config)?))
}

/// Saves (or changes) an answer, then continues or finishes.
///
/// A submission after the deadline finalizes the attempt without saving the answer.
pub async fn submit_answer(
    State(engine): State<ExamEngine>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_from_headers(&headers, &claims, &config)?;

    if is_overdue(&session, &config) {
        tracing::info!("Late submission on result {}, finalizing", session.result_id);
        let result = engine.force_finish(&session).await?;
        return Ok(Json(ExamStepResponse::Finalized(result)));
    }

    let response = match engine.submit_answer(&session, &req).await? {
        ExamStep::InProgress(next) => in_progress(&next, &config)?,
        ExamStep::Finalized(result) => ExamStepResponse::Finalized(result),
    };

    Ok(Json(response))
}

/// Called by the client-side timer when time runs out. Safe to repeat.
pub async fn finish_exam(
    State(engine): State<ExamEngine>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let session = session_from_headers(&headers, &claims, &config)?;
    let result = engine.force_finish(&session).await?;

    Ok(Json(ExamStepResponse::Finalized(result)))
}

/// A result with every answer and the question it was given for.
/// Results of other students redirect to the subject list.
pub async fn get_result(
    State(engine): State<ExamEngine>,
    Extension(claims): Extension<Claims>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = engine.get_result(result_id, claims.student_id()?).await?;

    Ok(Json(detail))
}
