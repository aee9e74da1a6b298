//! Cleanup for backend-generated session titles

const MAX_TITLE_LENGTH: usize = 60;
const MAX_QUERY_LENGTH: usize = 500;

/// Trim the question sent for title generation
pub fn title_query(question: &str) -> String {
    let trimmed = question.trim();
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        let cut: String = trimmed.chars().take(MAX_QUERY_LENGTH).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// Normalize a generated title: strip wrapping quotes and trailing
/// punctuation, collapse whitespace, cut at a word boundary.
/// Returns `None` when nothing usable is left.
pub fn clean_title(raw: &str) -> Option<String> {
    let first_line = raw.lines().find(|l| !l.trim().is_empty())?;
    let stripped = first_line
        .trim()
        .trim_start_matches(|c: char| c == '#' || c.is_whitespace())
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim_end_matches(['.', '!', ':', ';']);

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    if collapsed.chars().count() <= MAX_TITLE_LENGTH {
        return Some(collapsed);
    }

    let truncated: String = collapsed.chars().take(MAX_TITLE_LENGTH).collect();
    match truncated.rfind(' ') {
        Some(last_space) => Some(truncated[..last_space].to_string()),
        None => Some(truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("\"Fix Login Page CSS\"").as_deref(), Some("Fix Login Page CSS"));
        assert_eq!(clean_title("  Python   CSV  Parser.  ").as_deref(), Some("Python CSV Parser"));
        assert_eq!(clean_title("\n\n## Git Rebase Basics\nmore").as_deref(), Some("Git Rebase Basics"));
        assert_eq!(clean_title("   "), None);
        assert_eq!(clean_title("\"\""), None);
    }

    #[test]
    fn test_clean_title_truncation() {
        let long_title = "This is a very long title that should be truncated at some point for display";
        let result = clean_title(long_title).unwrap();
        assert!(result.chars().count() <= MAX_TITLE_LENGTH);
        assert!(!result.ends_with(' '));
        assert!(long_title.starts_with(&result));
    }

    #[test]
    fn test_title_query_truncates() {
        let question = "x".repeat(600);
        let query = title_query(&question);
        assert_eq!(query.chars().count(), MAX_QUERY_LENGTH + 3);
        assert_eq!(title_query("  short  "), "short");
    }
}
