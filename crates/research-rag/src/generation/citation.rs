//! Snippet helpers for source captions

/// Highlight question terms in a snippet using `wrap` for each match
pub fn highlight_snippet<F>(snippet: &str, query_terms: &[&str], wrap: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut highlighted = snippet.to_string();

    for term in query_terms {
        if term.len() < 3 {
            continue;
        }

        let re = regex::RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build();

        if let Ok(re) = re {
            highlighted = re
                .replace_all(&highlighted, |caps: &regex::Captures| wrap(&caps[0]))
                .to_string();
        }
    }

    highlighted
}

/// Split a question into terms worth highlighting
pub fn query_terms(question: &str) -> Vec<&str> {
    question
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| t.len() >= 3)
        .collect()
}

/// Truncate a snippet to at most `max_len` bytes plus an ellipsis, preferring a word boundary
pub fn truncate_snippet(snippet: &str, max_len: usize) -> String {
    let snippet = snippet.trim();
    if snippet.len() <= max_len {
        return snippet.to_string();
    }

    let mut end = max_len;
    while end > 0 && !snippet.is_char_boundary(end) {
        end -= 1;
    }

    if let Some(pos) = snippet[..end].rfind(char::is_whitespace) {
        if pos > end / 2 {
            return format!("{}...", snippet[..pos].trim_end());
        }
    }

    format!("{}...", &snippet[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_snippet() {
        let snippet = "Accuracy improved while latency and Accuracy variance dropped.";
        let highlighted = highlight_snippet(snippet, &["accuracy", "of"], |m| format!("<mark>{}</mark>", m));

        assert_eq!(highlighted.matches("<mark>Accuracy</mark>").count(), 2);
        assert!(!highlighted.contains("<mark>of</mark>"));
    }

    #[test]
    fn test_query_terms() {
        assert_eq!(
            query_terms("What is the F1-score of the model?"),
            vec!["What", "the", "F1-score", "the", "model"]
        );
    }

    #[test]
    fn test_truncate_snippet() {
        let snippet = "This is a very long snippet that needs to be truncated.";
        let truncated = truncate_snippet(snippet, 20);

        assert!(truncated.len() <= 23);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_snippet("short", 20), "short");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let snippet = "ééééééééééééééééééééééééé";
        let truncated = truncate_snippet(snippet, 7);
        assert!(truncated.starts_with("ééé"));
        assert!(truncated.ends_with("..."));
    }
}
