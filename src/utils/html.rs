// src/utils/html.rs

/// Clean HTML content using the ammonia library.
///
/// Keeps safe formatting tags and strips scripts, iframes and event
/// attributes. Applied to question text and options entered by admins,
/// since they are rendered to every student taking the exam.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<b>x²</b><script>alert(1)</script>");
        assert_eq!(cleaned, "<b>x²</b>");
    }
}
