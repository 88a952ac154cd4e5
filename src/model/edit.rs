//! Cursor-relative line edits on plain note text.
//!
//! Offsets are character offsets (not bytes), matching how the note buffer
//! addresses its cursor. Cursors past the end are clamped.

/// Prefix inserted by the bullet action.
pub const BULLET_PREFIX: &str = "- ";
/// Prefix inserted by the todo action.
pub const TODO_PREFIX: &str = " ⬜ ";

pub const UNCHECKED: &str = "⬜";
pub const CHECKED: &str = "☑️";

/// Character span `[start, end)` of the line holding `cursor`, newline excluded.
pub fn line_bounds(text: &str, cursor: usize) -> (usize, usize) {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());

    let start = chars[..cursor]
        .iter()
        .rposition(|&c| c == '\n')
        .map_or(0, |i| i + 1);
    let end = chars[cursor..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |i| cursor + i);

    (start, end)
}

/// Inserts `prefix` at the start of the cursor's line.
///
/// Returns the new text and the cursor shifted past the inserted prefix.
pub fn insert_prefix(text: &str, cursor: usize, prefix: &str) -> (String, usize) {
    let cursor = cursor.min(text.chars().count());
    let (start, _) = line_bounds(text, cursor);
    let at = byte_index(text, start);

    let mut out = String::with_capacity(text.len() + prefix.len());
    out.push_str(&text[..at]);
    out.push_str(prefix);
    out.push_str(&text[at..]);

    (out, cursor + prefix.chars().count())
}

/// Flips the todo marker on the cursor's line.
///
/// A checked marker takes priority: if the line has one, its first
/// occurrence becomes unchecked. Otherwise the first unchecked marker gets
/// checked. Lines with no marker yield `None`.
pub fn toggle_line_marker(text: &str, cursor: usize) -> Option<String> {
    let (start, end) = line_bounds(text, cursor);
    let (from, to) = (byte_index(text, start), byte_index(text, end));
    let line = &text[from..to];

    let new_line = if line.contains(CHECKED) {
        line.replacen(CHECKED, UNCHECKED, 1)
    } else if line.contains(UNCHECKED) {
        line.replacen(UNCHECKED, CHECKED, 1)
    } else {
        return None;
    };

    let mut out = String::with_capacity(text.len() + CHECKED.len());
    out.push_str(&text[..from]);
    out.push_str(&new_line);
    out.push_str(&text[to..]);
    Some(out)
}

fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, cursor: usize) -> String {
        let (start, end) = line_bounds(text, cursor);
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn isolates_the_middle_line() {
        assert_eq!(line_bounds("a\nbb\nccc", 4), (2, 4));
        assert_eq!(span("a\nbb\nccc", 4), "bb");
        assert_eq!(span("a\nbb\nccc", 3), "bb");
    }

    #[test]
    fn cursor_right_after_newline_belongs_to_next_line() {
        assert_eq!(span("a\nbb\nccc", 2), "bb");
        assert_eq!(span("a\nbb\nccc", 5), "ccc");
    }

    #[test]
    fn handles_text_edges() {
        assert_eq!(line_bounds("", 0), (0, 0));
        assert_eq!(line_bounds("abc", 0), (0, 3));
        assert_eq!(line_bounds("abc", 99), (0, 3));
        assert_eq!(line_bounds("abc\n", 4), (4, 4));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "⬜ é\nçà";
        assert_eq!(line_bounds(text, 5), (4, 6));
        assert_eq!(span(text, 1), "⬜ é");
    }

    #[test]
    fn bullet_goes_to_line_start() {
        let (text, cursor) = insert_prefix("a\nbb\nccc", 4, BULLET_PREFIX);
        assert_eq!(text, "a\n- bb\nccc");
        assert_eq!(cursor, 6);
    }

    #[test]
    fn prefix_into_empty_text() {
        let (text, cursor) = insert_prefix("", 0, TODO_PREFIX);
        assert_eq!(text, " ⬜ ");
        assert_eq!(cursor, 3);
    }

    #[test]
    fn prefix_after_multibyte_line() {
        let (text, cursor) = insert_prefix("çà\nx", 4, BULLET_PREFIX);
        assert_eq!(text, "çà\n- x");
        assert_eq!(cursor, 6);
    }

    #[test]
    fn toggles_back_and_forth() {
        let checked = toggle_line_marker("buy milk ⬜", 3).unwrap();
        assert_eq!(checked, "buy milk ☑️");
        let unchecked = toggle_line_marker(&checked, 3).unwrap();
        assert_eq!(unchecked, "buy milk ⬜");
    }

    #[test]
    fn line_without_marker_is_unchanged() {
        assert_eq!(toggle_line_marker("plain line", 2), None);
        assert_eq!(toggle_line_marker("", 0), None);
    }

    #[test]
    fn only_the_cursor_line_is_touched() {
        let text = "a ⬜\nb ⬜\nc ⬜";
        let toggled = toggle_line_marker(text, 5).unwrap();
        assert_eq!(toggled, "a ⬜\nb ☑️\nc ⬜");
    }

    #[test]
    fn marker_on_other_line_does_not_count() {
        assert_eq!(toggle_line_marker("done ☑️\nnothing here", 10), None);
    }

    #[test]
    fn checked_marker_wins_when_both_present() {
        let toggled = toggle_line_marker("⬜ a ☑️ b", 0).unwrap();
        assert_eq!(toggled, "⬜ a ⬜ b");
    }

    #[test]
    fn only_first_occurrence_flips() {
        let toggled = toggle_line_marker("⬜ one ⬜ two", 0).unwrap();
        assert_eq!(toggled, "☑️ one ⬜ two");
    }
}
