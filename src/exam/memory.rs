// src/exam/memory.rs

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

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

#[derive(Default)]
struct Tables {
    next_id: i64,
    subjects: BTreeMap<i64, Subject>,
    questions: BTreeMap<i64, Question>,
    results: BTreeMap<i64, ExamResult>,
    answers: HashMap<(i64, i64), ExamAnswer>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process `ExamStore`. Every call holds one lock for its whole body, so
/// answer and finalize updates are atomic just like the Postgres transactions.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store poisoned".to_string()))
    }

    pub fn add_subject(
        &self,
        name: &str,
        grade: &str,
        default_duration: i32,
        default_questions: i32,
    ) -> Result<Subject, AppError> {
        let mut tables = self.tables()?;
        let subject = Subject {
            id: tables.next_id(),
            name: name.to_string(),
            grade: grade.to_string(),
            default_duration,
            default_questions,
        };
        tables.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    /// Adds a question whose options are "A".."D" and whose answer is `correct_option`.
    pub fn add_question(
        &self,
        subject_id: i64,
        text: &str,
        correct_option: &str,
    ) -> Result<Question, AppError> {
        let mut tables = self.tables()?;
        let question = Question {
            id: tables.next_id(),
            subject_id,
            text: text.to_string(),
            option1: "A".to_string(),
            option2: "B".to_string(),
            option3: "C".to_string(),
            option4: "D".to_string(),
            correct_option: correct_option.to_string(),
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    pub fn result_count(&self) -> Result<usize, AppError> {
        Ok(self.tables()?.results.len())
    }

    pub fn answer_count(&self, result_id: i64) -> Result<usize, AppError> {
        Ok(self
            .tables()?
            .answers
            .keys()
            .filter(|(r, _)| *r == result_id)
            .count())
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, AppError> {
        Ok(self.tables()?.subjects.get(&id).cloned())
    }

    async fn question_ids_for_subject(&self, subject_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .tables()?
            .questions
            .values()
            .filter(|q| q.subject_id == subject_id)
            .map(|q| q.id)
            .collect())
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.tables()?.questions.get(&id).cloned())
    }

    async fn create_result(
        &self,
        student_id: i64,
        subject_id: i64,
        total_questions: i32,
    ) -> Result<ExamResult, AppError> {
        let mut tables = self.tables()?;
        let result = ExamResult {
            id: tables.next_id(),
            student_id,
            subject_id,
            score: 0.0,
            correct_count: 0,
            wrong_count: 0,
            total_questions,
            created_at: chrono::Utc::now(),
            finalized_at: None,
        };
        tables.results.insert(result.id, result.clone());
        Ok(result)
    }

    async fn find_result(&self, id: i64) -> Result<Option<ExamResult>, AppError> {
        Ok(self.tables()?.results.get(&id).cloned())
    }

    async fn record_answer(
        &self,
        result_id: i64,
        question_id: i64,
        selected: &str,
        is_correct: bool,
    ) -> Result<ExamResult, AppError> {
        let mut tables = self.tables()?;
        let tables = &mut *tables;

        let result = tables
            .results
            .get(&result_id)
            .ok_or(AppError::NotFound("Exam result not found".to_string()))?;
        if result.is_finalized() {
            return Err(AppError::NoActiveExam);
        }

        let existing = tables
            .answers
            .get(&(result_id, question_id))
            .map(|a| (a.id, a.is_correct));
        let previous = existing.map(|(_, was_correct)| was_correct);
        let id = match existing {
            Some((id, _)) => id,
            None => tables.next_id(),
        };
        tables.answers.insert(
            (result_id, question_id),
            ExamAnswer {
                id,
                result_id,
                question_id,
                student_answer: selected.to_string(),
                is_correct,
            },
        );

        let (correct_delta, wrong_delta) = tally_delta(previous, is_correct);
        let result = tables
            .results
            .get_mut(&result_id)
            .ok_or(AppError::NotFound("Exam result not found".to_string()))?;
        result.correct_count += correct_delta;
        result.wrong_count += wrong_delta;

        Ok(result.clone())
    }

    async fn finalize_result(&self, result_id: i64) -> Result<ExamResult, AppError> {
        let mut tables = self.tables()?;
        let result = tables
            .results
            .get_mut(&result_id)
            .ok_or(AppError::NotFound("Exam result not found".to_string()))?;

        if !result.is_finalized() {
            let tally = finalize_tally(
                result.correct_count,
                result.wrong_count,
                result.total_questions,
            );
            result.correct_count = tally.correct_count;
            result.wrong_count = tally.wrong_count;
            result.score = tally.score;
            result.finalized_at = Some(chrono::Utc::now());
        }

        Ok(result.clone())
    }

    async fn answers_for_result(&self, result_id: i64) -> Result<Vec<ExamAnswer>, AppError> {
        let tables = self.tables()?;
        let mut answers: Vec<ExamAnswer> = tables
            .answers
            .values()
            .filter(|a| a.result_id == result_id)
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.id);
        Ok(answers)
    }

    async fn answer_details(&self, result_id: i64) -> Result<Vec<AnswerDetail>, AppError> {
        let answers = self.answers_for_result(result_id).await?;
        let tables = self.tables()?;

        Ok(answers
            .into_iter()
            .filter_map(|a| {
                let q = tables.questions.get(&a.question_id)?;
                Some(AnswerDetail {
                    question_id: q.id,
                    text: q.text.clone(),
                    option1: q.option1.clone(),
                    option2: q.option2.clone(),
                    option3: q.option3.clone(),
                    option4: q.option4.clone(),
                    correct_option: q.correct_option.clone(),
                    student_answer: a.student_answer,
                    is_correct: a.is_correct,
                })
            })
            .collect())
    }
}
