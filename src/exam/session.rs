// src/exam/session.rs

use serde::{Deserialize, Serialize};

/// Per-attempt navigation state. Carried by the caller between requests
/// (inside the exam token); the server never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSession {
    pub result_id: i64,
    pub student_id: i64,
    pub subject_id: i64,

    /// Question ids in the order drawn for this attempt.
    pub question_ids: Vec<i64>,

    /// Position in `question_ids` currently on screen.
    pub index: usize,

    pub duration_minutes: i32,

    /// Unix timestamp (seconds) of the start.
    pub started_at: i64,
}

impl ExamSession {
    pub fn len(&self) -> usize {
        self.question_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    /// Clamps any requested position into `[0, len - 1]`.
    pub fn clamp_index(&self, requested: i64) -> usize {
        if self.is_empty() || requested <= 0 {
            return 0;
        }
        let last = self.len() - 1;
        usize::try_from(requested).map_or(last, |i| i.min(last))
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    pub fn current_question_id(&self) -> Option<i64> {
        self.question_ids.get(self.clamp_index(self.index as i64)).copied()
    }

    pub fn contains(&self, question_id: i64) -> bool {
        self.question_ids.contains(&question_id)
    }

    /// Unix timestamp at which the duration runs out.
    pub fn deadline(&self) -> i64 {
        self.started_at + i64::from(self.duration_minutes) * 60
    }

    pub fn remaining_seconds(&self, now: i64) -> i64 {
        (self.deadline() - now).max(0)
    }

    pub fn is_overdue(&self, now: i64, grace_seconds: i64) -> bool {
        now > self.deadline() + grace_seconds
    }
}

/// Parses a position coming from a query string. Garbage reads as 0.
pub fn parse_index(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}
