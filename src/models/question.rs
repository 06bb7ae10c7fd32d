// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Valid values of `correct_option` and of a student's selection.
pub const OPTION_MARKERS: [&str; 4] = ["1", "2", "3", "4"];

pub fn is_option_marker(value: &str) -> bool {
    OPTION_MARKERS.contains(&value)
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub subject_id: i64,

    /// The text content of the question.
    pub text: String,

    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,

    /// "1" to "4", pointing at one of the options.
    pub correct_option: String,
}

impl Question {
    pub fn is_correct(&self, selected: &str) -> bool {
        self.correct_option == selected
    }
}

/// DTO for sending a question to a student mid-exam (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub options: [String; 4],
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            options: [q.option1, q.option2, q.option3, q.option4],
        }
    }
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[validate(length(min = 1, max = 255))]
    pub option1: String,
    #[validate(length(min = 1, max = 255))]
    pub option2: String,
    #[validate(length(min = 1, max = 255))]
    pub option3: String,
    #[validate(length(min = 1, max = 255))]
    pub option4: String,
    #[validate(custom(function = validate_correct_option))]
    pub correct_option: String,
}

fn validate_correct_option(value: &str) -> Result<(), validator::ValidationError> {
    if !is_option_marker(value) {
        return Err(validator::ValidationError::new("correct_option_out_of_range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(correct: &str) -> QuestionRequest {
        QuestionRequest {
            text: "2 + 2 = ?".into(),
            option1: "3".into(),
            option2: "4".into(),
            option3: "5".into(),
            option4: "22".into(),
            correct_option: correct.into(),
        }
    }

    #[test]
    fn correct_option_must_be_one_to_four() {
        assert!(request("2").validate().is_ok());
        assert!(request("0").validate().is_err());
        assert!(request("B").validate().is_err());
    }

    #[test]
    fn public_question_hides_answer() {
        let q = Question {
            id: 7,
            subject_id: 1,
            text: "t".into(),
            option1: "a".into(),
            option2: "b".into(),
            option3: "c".into(),
            option4: "d".into(),
            correct_option: "3".into(),
        };
        assert!(q.is_correct("3"));
        let json = serde_json::to_value(PublicQuestion::from(q)).unwrap();
        assert!(json.get("correct_option").is_none());
        assert_eq!(json["options"][2], "c");
    }
}
