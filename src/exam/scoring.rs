// src/exam/scoring.rs

//! Counter arithmetic shared by every store implementation.

/// Change to `(correct_count, wrong_count)` when an answer with correctness
/// `is_correct` replaces `previous` (None if the question had no answer yet).
pub fn tally_delta(previous: Option<bool>, is_correct: bool) -> (i32, i32) {
    match (previous, is_correct) {
        (None, true) => (1, 0),
        (None, false) => (0, 1),
        (Some(false), true) => (1, -1),
        (Some(true), false) => (-1, 1),
        (Some(_), _) => (0, 0),
    }
}

/// Final counters and score of an attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalTally {
    pub correct_count: i32,
    pub wrong_count: i32,
    pub score: f64,
}

/// Unanswered questions count as wrong. An empty attempt scores 0.
pub fn finalize_tally(correct_count: i32, wrong_count: i32, total: i32) -> FinalTally {
    let wrong_count = if total > 0 && correct_count + wrong_count != total {
        (total - correct_count).max(0)
    } else {
        wrong_count
    };

    FinalTally {
        correct_count,
        wrong_count,
        score: score_percent(correct_count, total),
    }
}

pub fn score_percent(correct_count: i32, total: i32) -> f64 {
    let total = total.max(1);
    f64::from(correct_count) / f64::from(total) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_answer_moves_one_counter() {
        assert_eq!(tally_delta(None, true), (1, 0));
        assert_eq!(tally_delta(None, false), (0, 1));
    }

    #[test]
    fn changed_correctness_moves_one_unit() {
        assert_eq!(tally_delta(Some(false), true), (1, -1));
        assert_eq!(tally_delta(Some(true), false), (-1, 1));
        assert_eq!(tally_delta(Some(true), true), (0, 0));
        assert_eq!(tally_delta(Some(false), false), (0, 0));
    }

    #[test]
    fn unanswered_fold_into_wrong() {
        let tally = finalize_tally(2, 0, 3);
        assert_eq!(tally.correct_count, 2);
        assert_eq!(tally.wrong_count, 1);
        assert!((tally.score - 66.666_666).abs() < 1e-3);
    }

    #[test]
    fn complete_attempt_is_left_alone() {
        let tally = finalize_tally(3, 1, 4);
        assert_eq!((tally.correct_count, tally.wrong_count), (3, 1));
        assert_eq!(tally.score, 75.0);
    }

    #[test]
    fn empty_attempt_scores_zero() {
        let tally = finalize_tally(0, 0, 0);
        assert_eq!(tally.wrong_count, 0);
        assert_eq!(tally.score, 0.0);
    }
}
