use std::sync::LazyLock;

use regex::Regex;

use super::topic::{AppState, Topic};

/// Shown in place of the list when nothing matches.
pub const NO_RESULTS: &str = "No topics found.";
/// Preview text for a topic whose note is blank.
pub const EMPTY_PREVIEW: &str = "…";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Topics newest-first, narrowed to those matching `query` when it is not blank.
pub fn project<'a>(state: &'a AppState, query: &str) -> Vec<&'a Topic> {
    let mut topics: Vec<&Topic> = state.topics.iter().collect();
    topics.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let query = query.trim().to_lowercase();
    if !query.is_empty() {
        topics.retain(|t| matches(t, &query));
    }

    topics
}

fn matches(topic: &Topic, lowered_query: &str) -> bool {
    format!("{} {}", topic.title, topic.note)
        .to_lowercase()
        .contains(lowered_query)
}

/// Single-line summary of a note: whitespace collapsed, cut at `max_chars`.
pub fn preview(note: &str, max_chars: usize) -> String {
    let collapsed = WHITESPACE_RE.replace_all(note.trim(), " ");
    let mut out: String = collapsed.chars().take(max_chars).collect();
    if collapsed.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topic::TopicId;

    fn topic(id: &str, title: &str, note: &str, updated_at: i64) -> Topic {
        Topic {
            id: TopicId(id.into()),
            title: title.into(),
            note: note.into(),
            updated_at,
        }
    }

    fn ids(topics: &[&Topic]) -> Vec<String> {
        topics.iter().map(|t| t.id.to_string()).collect()
    }

    fn sample() -> AppState {
        AppState {
            topics: vec![
                topic("a", "Alpha plan", "first", 10),
                topic("b", "Misc", "notes about BETA", 30),
                topic("c", "Other", "mentions alphabet soup", 20),
            ],
            active_id: None,
        }
    }

    #[test]
    fn sorts_newest_first() {
        let state = sample();
        assert_eq!(ids(&project(&state, "")), ["b", "c", "a"]);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let state = AppState {
            topics: vec![topic("x", "", "", 5), topic("y", "", "", 5)],
            active_id: None,
        };
        assert_eq!(ids(&project(&state, "")), ["x", "y"]);
    }

    #[test]
    fn filters_case_insensitively() {
        let state = AppState {
            topics: vec![
                topic("one", "alpha", "", 1),
                topic("two", "beta", "", 2),
            ],
            active_id: None,
        };
        assert_eq!(ids(&project(&state, "ALP")), ["one"]);
        assert_eq!(ids(&project(&state, "alp")), ["one"]);
    }

    #[test]
    fn searches_title_and_note() {
        let state = sample();
        assert_eq!(ids(&project(&state, "alp")), ["c", "a"]);
        assert_eq!(ids(&project(&state, "beta")), ["b"]);
    }

    #[test]
    fn blank_query_is_no_filter() {
        let state = sample();
        assert_eq!(project(&state, "   ").len(), 3);
    }

    #[test]
    fn no_match_yields_empty_projection() {
        let state = sample();
        assert!(project(&state, "zzz").is_empty());
        assert!(project(&AppState::default(), "").is_empty());
    }

    #[test]
    fn preview_collapses_whitespace() {
        assert_eq!(preview("  one\n\n two\tthree  ", 70), "one two three");
        assert_eq!(preview("   ", 70), "");
    }

    #[test]
    fn preview_truncates_with_ellipsis() {
        let long = "x".repeat(71);
        let cut = preview(&long, 70);
        assert_eq!(cut, format!("{}...", "x".repeat(70)));
        assert_eq!(preview(&"y".repeat(70), 70), "y".repeat(70));
    }

    #[test]
    fn preview_counts_characters() {
        assert_eq!(preview("çççç", 2), "çç...");
    }
}
