// src/models/grade.rs

use serde::Serialize;

/// Grade labels a student registers with. Also the levels offered when
/// picking a cohort inside the portal.
pub const STUDENT_GRADES: [&str; 3] = ["العاشر", "الأول الثانوي", "الثاني الثانوي"];

pub const LEVEL_CHOICES: [&str; 3] = STUDENT_GRADES;
pub const TRACK_CHOICES: [&str; 2] = ["أكاديمي", "مهني"];
pub const SEMESTER_CHOICES: [&str; 2] = ["الفصل الأول", "الفصل الثاني"];

/// Builds the composite key stored on a subject, e.g.
/// `"الثاني الثانوي – أكاديمي – الفصل الأول"`.
pub fn build_grade_key(level: &str, track: &str, semester: &str) -> String {
    format!("{level} – {track} – {semester}")
}

/// Every level/track/semester combination, in menu order.
pub fn all_grade_keys() -> Vec<String> {
    let mut keys = Vec::with_capacity(LEVEL_CHOICES.len() * TRACK_CHOICES.len() * SEMESTER_CHOICES.len());
    for level in LEVEL_CHOICES {
        for track in TRACK_CHOICES {
            for semester in SEMESTER_CHOICES {
                keys.push(build_grade_key(level, track, semester));
            }
        }
    }
    keys
}

pub fn is_student_grade(grade: &str) -> bool {
    STUDENT_GRADES.contains(&grade)
}

pub fn is_grade_key(key: &str) -> bool {
    all_grade_keys().iter().any(|k| k == key)
}

/// Choices offered on the cohort selection screen.
#[derive(Debug, Serialize)]
pub struct GradeChoices {
    pub levels: Vec<&'static str>,
    pub tracks: Vec<&'static str>,
    pub semesters: Vec<&'static str>,
}

impl GradeChoices {
    pub fn all() -> Self {
        Self {
            levels: LEVEL_CHOICES.to_vec(),
            tracks: TRACK_CHOICES.to_vec(),
            semesters: SEMESTER_CHOICES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_key_joins_with_dash() {
        assert_eq!(
            build_grade_key("العاشر", "مهني", "الفصل الثاني"),
            "العاشر – مهني – الفصل الثاني"
        );
    }

    #[test]
    fn every_combination_is_listed_once() {
        let keys = all_grade_keys();
        assert_eq!(keys.len(), 12);
        assert!(is_grade_key(&build_grade_key("الأول الثانوي", "أكاديمي", "الفصل الأول")));
        assert!(!is_grade_key("العاشر"));
    }

    #[test]
    fn student_grade_must_be_known() {
        assert!(is_student_grade("الثاني الثانوي"));
        assert!(!is_student_grade("الحادي عشر"));
    }
}
