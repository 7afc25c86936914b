//! Defensive parser for the four-section assessment format.
//!
//! The completion service is *asked* to return `Summary:`, `Score:`,
//! `Issues:` and `Follow-Ups:` sections, but nothing enforces that. The
//! parser is a label-delimited scanner: each recognized label owns the text
//! up to the next recognized label or end of input, in whatever order the
//! labels appear. Absent labels are simply absent from the output; malformed
//! input yields an empty result, never an error.

/// The recognized section labels, matched literally followed by a colon.
const LABELS: [&str; 4] = ["Summary", "Score", "Issues", "Follow-Ups"];

/// Parsed assessment sections. `None` means the label never appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAssessment {
    pub summary: Option<String>,
    /// Raw score text; integer coercion is the caller's concern.
    pub score: Option<String>,
    pub issues: Option<Vec<String>>,
    pub follow_ups: Option<Vec<String>>,
}

pub fn parse(text: &str) -> ParsedAssessment {
    // Every occurrence of every label, in document order. If a label repeats,
    // the last occurrence wins.
    let mut marks: Vec<(usize, &str)> = Vec::new();
    for label in LABELS {
        let needle = format!("{label}:");
        let mut from = 0;
        while let Some(found) = text[from..].find(&needle) {
            let at = from + found;
            marks.push((at, label));
            from = at + needle.len();
        }
    }
    marks.sort_unstable_by_key(|(at, _)| *at);

    let mut result = ParsedAssessment::default();
    for (i, (at, label)) in marks.iter().enumerate() {
        let value_start = at + label.len() + 1;
        let value_end = marks.get(i + 1).map_or(text.len(), |(next, _)| *next);
        let value = text[value_start..value_end].trim();

        match *label {
            "Summary" => result.summary = Some(value.to_string()),
            "Score" => result.score = Some(value.to_string()),
            "Issues" => result.issues = Some(split_issues(value)),
            "Follow-Ups" => result.follow_ups = Some(split_follow_ups(value)),
            _ => unreachable!(),
        }
    }
    result
}

/// Comma-separated, trimmed. A literal `None` answer stays as-is.
fn split_issues(value: &str) -> Vec<String> {
    value.split(',').map(|item| item.trim().to_string()).collect()
}

/// One entry per non-blank line, leading bullet markers and whitespace stripped.
fn split_follow_ups(value: &str) -> Vec<String> {
    value
        .lines()
        .map(|line| line.trim_matches(|c: char| c == '*' || c.is_whitespace()))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response_parses_all_sections() {
        let parsed = parse("Summary: ok\nScore: 7\nIssues: None\nFollow-Ups: * a\n* b");
        assert_eq!(parsed.summary.as_deref(), Some("ok"));
        assert_eq!(parsed.score.as_deref(), Some("7"));
        assert_eq!(parsed.issues, Some(vec!["None".to_string()]));
        assert_eq!(parsed.follow_ups, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_garbage_yields_empty_result_without_panicking() {
        assert_eq!(parse("garbage"), ParsedAssessment::default());
        assert_eq!(parse(""), ParsedAssessment::default());
    }

    #[test]
    fn test_sections_may_be_reordered() {
        let parsed = parse("Score: 4\nSummary: solid profile\nIssues: gap in 2021, no email");
        assert_eq!(parsed.score.as_deref(), Some("4"));
        assert_eq!(parsed.summary.as_deref(), Some("solid profile"));
        assert_eq!(
            parsed.issues,
            Some(vec!["gap in 2021".to_string(), "no email".to_string()])
        );
        assert_eq!(parsed.follow_ups, None);
    }

    #[test]
    fn test_absent_labels_are_absent_from_output() {
        let parsed = parse("Summary: only a summary here");
        assert!(parsed.summary.is_some());
        assert!(parsed.score.is_none());
        assert!(parsed.issues.is_none());
        assert!(parsed.follow_ups.is_none());
    }

    #[test]
    fn test_multiline_summary_runs_to_the_next_label() {
        let parsed = parse("Summary: first line\nsecond line\nScore: 9");
        assert_eq!(parsed.summary.as_deref(), Some("first line\nsecond line"));
        assert_eq!(parsed.score.as_deref(), Some("9"));
    }

    #[test]
    fn test_blank_bullet_lines_are_discarded() {
        let parsed = parse("Follow-Ups:\n* first\n\n  *  second  \n*\n");
        assert_eq!(
            parsed.follow_ups,
            Some(vec!["first".to_string(), "second".to_string()])
        );
    }

    #[test]
    fn test_repeated_label_keeps_the_last_occurrence() {
        let parsed = parse("Score: 3\nScore: 8");
        assert_eq!(parsed.score.as_deref(), Some("8"));
    }
}
