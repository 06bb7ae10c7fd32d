// src/exam/engine.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};

use crate::{
    error::AppError,
    exam::{session::ExamSession, store::ExamStore},
    models::{
        exam::{ExamAction, ExamResult, QuestionView, ResultDetail, SubmitAnswerRequest},
        question::{PublicQuestion, is_option_marker},
    },
};

/// Outcome of a submission: either the attempt goes on with a new session
/// value, or it has been finalized and the session must be discarded.
#[derive(Debug)]
pub enum ExamStep {
    InProgress(ExamSession),
    Finalized(ExamResult),
}

/// Drives attempts over an `ExamStore`.
#[derive(Clone)]
pub struct ExamEngine {
    store: Arc<dyn ExamStore>,
}

impl ExamEngine {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self { store }
    }

    /// Draws the question set for a new attempt and creates its result row.
    ///
    /// The set holds `subject.default_questions` questions, or the whole bank
    /// when it is smaller, in an order decided by `rng`.
    pub async fn start<R: Rng + Send + ?Sized>(
        &self,
        subject_id: i64,
        student_id: i64,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<ExamSession, AppError> {
        let subject = self
            .store
            .find_subject(subject_id)
            .await?
            .ok_or(AppError::NotFound("Subject not found".to_string()))?;

        let bank = self.store.question_ids_for_subject(subject.id).await?;
        if bank.is_empty() {
            tracing::info!("Subject {} has no questions, exam not started", subject.id);
            return Err(AppError::NoQuestionsAvailable);
        }

        let wanted = usize::try_from(subject.default_questions.max(1)).unwrap_or(1);
        let mut question_ids: Vec<i64> = bank
            .choose_multiple(rng, wanted.min(bank.len()))
            .copied()
            .collect();
        question_ids.shuffle(rng);

        let total = i32::try_from(question_ids.len())
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        let result = self
            .store
            .create_result(student_id, subject.id, total)
            .await?;

        tracing::info!(
            "Exam started: result={}, student={}, subject={}, questions={}",
            result.id,
            student_id,
            subject.id,
            total
        );

        Ok(ExamSession {
            result_id: result.id,
            student_id,
            subject_id: subject.id,
            question_ids,
            index: 0,
            duration_minutes: subject.default_duration,
            started_at: now.timestamp(),
        })
    }

    /// Records the optional answer, then continues or finishes.
    ///
    /// Selections that are not "1".."4", or that target a question outside the
    /// attempt, are ignored and the call behaves as plain navigation.
    pub async fn submit_answer(
        &self,
        session: &ExamSession,
        req: &SubmitAnswerRequest,
    ) -> Result<ExamStep, AppError> {
        let result = self.active_result(session).await?;

        let selected = req
            .answer
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(selected) = selected {
            if !is_option_marker(selected) {
                tracing::warn!("Ignoring invalid option {:?} on result {}", selected, result.id);
            } else if !session.contains(req.question_id) {
                tracing::warn!(
                    "Ignoring answer for question {} outside result {}",
                    req.question_id,
                    result.id
                );
            } else {
                let question = self
                    .store
                    .find_question(req.question_id)
                    .await?
                    .ok_or(AppError::NotFound("Question not found".to_string()))?;

                let is_correct = question.is_correct(selected);
                let updated = self
                    .store
                    .record_answer(result.id, question.id, selected, is_correct)
                    .await?;

                tracing::debug!(
                    "Answer recorded: result={}, question={}, correct={}, tally={}/{}",
                    updated.id,
                    question.id,
                    is_correct,
                    updated.correct_count,
                    updated.wrong_count
                );
            }
        }

        match req.action {
            ExamAction::Finish => self.finalize(session).await.map(ExamStep::Finalized),
            ExamAction::Continue => {
                let current = req
                    .current_index
                    .map_or(session.index, |i| session.clamp_index(i));
                let next = current + 1;

                if next >= session.len() {
                    self.finalize(session).await.map(ExamStep::Finalized)
                } else {
                    Ok(ExamStep::InProgress(session.with_index(next)))
                }
            }
        }
    }

    /// Moves to another question without touching the attempt's counters.
    /// A finalized attempt cannot be navigated any more.
    pub async fn jump_to_index(
        &self,
        session: &ExamSession,
        index: i64,
    ) -> Result<ExamSession, AppError> {
        self.active_result(session).await?;

        Ok(session.with_index(session.clamp_index(index)))
    }

    /// Ends the attempt with whatever has been answered so far.
    /// Calling it again on a finalized attempt returns the stored result.
    pub async fn force_finish(&self, session: &ExamSession) -> Result<ExamResult, AppError> {
        self.owned_result(session.result_id, session.student_id)
            .await
            .map_err(|e| match e {
                AppError::Forbidden | AppError::NotFound(_) => AppError::NoActiveExam,
                other => other,
            })?;

        self.finalize(session).await
    }

    /// The result plus every answer, joined with the question it answers.
    pub async fn get_result(
        &self,
        result_id: i64,
        student_id: i64,
    ) -> Result<ResultDetail, AppError> {
        let result = self.owned_result(result_id, student_id).await?;
        let answers = self.store.answer_details(result.id).await?;

        Ok(ResultDetail { result, answers })
    }

    /// The question on screen, with the saved selection and the answered positions.
    pub async fn current_question(
        &self,
        session: &ExamSession,
        now: DateTime<Utc>,
    ) -> Result<QuestionView, AppError> {
        let result = self.active_result(session).await?;

        let index = session.clamp_index(session.index as i64);
        let question_id = session
            .question_ids
            .get(index)
            .copied()
            .ok_or(AppError::NoActiveExam)?;

        let question = self
            .store
            .find_question(question_id)
            .await?
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

        let answers: HashMap<i64, String> = self
            .store
            .answers_for_result(result.id)
            .await?
            .into_iter()
            .map(|a| (a.question_id, a.student_answer))
            .collect();

        let saved_answer = answers
            .get(&question_id)
            .and_then(|a| a.parse::<u8>().ok());

        let answered = session
            .question_ids
            .iter()
            .enumerate()
            .filter(|(_, qid)| answers.contains_key(qid))
            .map(|(i, _)| i)
            .collect();

        Ok(QuestionView {
            question: PublicQuestion::from(question),
            index,
            total_questions: session.len(),
            duration_minutes: session.duration_minutes,
            remaining_seconds: session.remaining_seconds(now.timestamp()),
            saved_answer,
            answered,
        })
    }

    async fn finalize(&self, session: &ExamSession) -> Result<ExamResult, AppError> {
        let result = self.store.finalize_result(session.result_id).await?;

        tracing::info!(
            "Exam finalized: result={}, correct={}, wrong={}, score={:.2}",
            result.id,
            result.correct_count,
            result.wrong_count,
            result.score
        );

        Ok(result)
    }

    async fn owned_result(&self, result_id: i64, student_id: i64) -> Result<ExamResult, AppError> {
        let result = self
            .store
            .find_result(result_id)
            .await?
            .ok_or(AppError::NotFound("Exam result not found".to_string()))?;

        if result.student_id != student_id {
            tracing::warn!(
                "Student {} requested result {} owned by {}",
                student_id,
                result_id,
                result.student_id
            );
            return Err(AppError::Forbidden);
        }

        Ok(result)
    }

    /// A session is only usable while its result exists, is owned by the
    /// session's student and has not been finalized.
    async fn active_result(&self, session: &ExamSession) -> Result<ExamResult, AppError> {
        match self.owned_result(session.result_id, session.student_id).await {
            Ok(result) if !result.is_finalized() => Ok(result),
            Ok(_) | Err(AppError::NotFound(_)) | Err(AppError::Forbidden) => {
                Err(AppError::NoActiveExam)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::memory::MemoryStore;
    use rand::{SeedableRng, rngs::StdRng};

    fn engine_with_questions(count: usize, per_exam: i32) -> (ExamEngine, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let subject = store.add_subject("Physics", "key", 30, per_exam).unwrap();
        for i in 0..count {
            store
                .add_question(subject.id, &format!("Q{i}"), "1")
                .unwrap();
        }
        (ExamEngine::new(store.clone()), store, subject.id)
    }

    #[tokio::test]
    async fn start_draws_configured_count() {
        let (engine, _, subject_id) = engine_with_questions(10, 4);
        let mut rng = StdRng::seed_from_u64(7);

        let session = engine.start(subject_id, 1, &mut rng, Utc::now()).await.unwrap();

        assert_eq!(session.len(), 4);
        assert_eq!(session.index, 0);
        assert_eq!(session.duration_minutes, 30);
    }

    #[tokio::test]
    async fn same_seed_draws_same_order() {
        let (engine, _, subject_id) = engine_with_questions(20, 5);

        let a = engine
            .start(subject_id, 1, &mut StdRng::seed_from_u64(42), Utc::now())
            .await
            .unwrap();
        let b = engine
            .start(subject_id, 1, &mut StdRng::seed_from_u64(42), Utc::now())
            .await
            .unwrap();

        assert_eq!(a.question_ids, b.question_ids);
        assert_ne!(a.result_id, b.result_id);
    }

    #[tokio::test]
    async fn start_on_unknown_subject_is_not_found() {
        let (engine, _, _) = engine_with_questions(1, 1);
        let err = engine
            .start(999, 1, &mut StdRng::seed_from_u64(1), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn jump_never_leaves_bounds() {
        let (engine, _, subject_id) = engine_with_questions(10, 10);
        let session = engine
            .start(subject_id, 1, &mut StdRng::seed_from_u64(3), Utc::now())
            .await
            .unwrap();

        for (requested, expected) in [(-5, 0), (999, 9), (6, 6)] {
            let moved = engine.jump_to_index(&session, requested).await.unwrap();
            assert_eq!(moved.index, expected);
        }
    }

    #[tokio::test]
    async fn jump_on_finalized_attempt_is_not_active() {
        let (engine, store, subject_id) = engine_with_questions(3, 3);
        let session = engine
            .start(subject_id, 1, &mut StdRng::seed_from_u64(5), Utc::now())
            .await
            .unwrap();
        engine.force_finish(&session).await.unwrap();

        let err = engine.jump_to_index(&session, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NoActiveExam));
        assert_eq!(store.answer_count(session.result_id).unwrap(), 0);
    }
}
