use ropey::Rope;

use super::cursor::CursorState;
use crate::msg::Direction;

/// Viewport state for scroll tracking.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub top_line: usize,
    pub height: u16,
    pub scroll_off: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            top_line: 0,
            height: 20,
            scroll_off: 3,
        }
    }
}

/// An editable text field backed by a Rope.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    pub rope: Rope,
    pub cursor: CursorState,
    pub viewport: Viewport,
}

impl Buffer {
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.rope.chars().all(char::is_whitespace)
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Replace the whole content, leaving the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.set_cursor_offset(self.rope.len_chars());
        self.scroll_to_cursor();
    }

    /// Replace the whole content, keeping the cursor at a character offset.
    pub fn replace(&mut self, text: &str, cursor: usize) {
        self.rope = Rope::from_str(text);
        self.set_cursor_offset(cursor);
        self.scroll_to_cursor();
    }

    pub fn clear(&mut self) {
        self.replace("", 0);
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the text of a specific line (without trailing newline).
    pub fn line_text(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(idx);
        let mut s: String = line.chunks().collect();
        if s.ends_with('\n') {
            s.pop();
        }
        if s.ends_with('\r') {
            s.pop();
        }
        Some(s)
    }

    fn line_len(&self, idx: usize) -> usize {
        self.line_text(idx).map(|l| l.chars().count()).unwrap_or(0)
    }

    /// Character offset of the cursor from the start of the buffer.
    pub fn cursor_offset(&self) -> usize {
        self.rope.line_to_char(self.cursor.row) + self.cursor.col
    }

    pub fn set_cursor_offset(&mut self, offset: usize) {
        let offset = offset.min(self.rope.len_chars());
        let row = self.rope.char_to_line(offset);
        let col = offset - self.rope.line_to_char(row);
        self.cursor.move_to(row, col);
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        let idx = self.cursor_offset();
        self.rope.insert_char(idx, ch);
        self.cursor.col += 1;
        self.cursor.desired_col = self.cursor.col;
        self.scroll_to_cursor();
    }

    /// Insert a newline at the cursor position.
    pub fn insert_newline(&mut self) {
        let idx = self.cursor_offset();
        self.rope.insert_char(idx, '\n');
        self.cursor.row += 1;
        self.cursor.col = 0;
        self.cursor.desired_col = 0;
        self.scroll_to_cursor();
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        let idx = self.cursor_offset();
        if idx == 0 {
            return;
        }
        self.rope.remove(idx - 1..idx);
        self.set_cursor_offset(idx - 1);
        self.scroll_to_cursor();
    }

    pub fn move_cursor(&mut self, dir: Direction) {
        match dir {
            Direction::Up => {
                if self.cursor.row > 0 {
                    self.cursor.row -= 1;
                    self.cursor.col = self.cursor.desired_col;
                }
            }
            Direction::Down => {
                if self.cursor.row < self.line_count().saturating_sub(1) {
                    self.cursor.row += 1;
                    self.cursor.col = self.cursor.desired_col;
                }
            }
            Direction::Left => {
                let offset = self.cursor_offset();
                if offset > 0 {
                    self.set_cursor_offset(offset - 1);
                }
            }
            Direction::Right => {
                let offset = self.cursor_offset();
                if offset < self.len_chars() {
                    self.set_cursor_offset(offset + 1);
                }
            }
            Direction::LineStart => {
                self.cursor.col = 0;
                self.cursor.desired_col = 0;
            }
            Direction::LineEnd => {
                let len = self.line_len(self.cursor.row);
                self.cursor.col = len;
                self.cursor.desired_col = len;
            }
        }
        self.clamp_cursor();
        self.scroll_to_cursor();
    }

    /// Ensure the cursor stays within valid bounds.
    pub fn clamp_cursor(&mut self) {
        let max_row = self.rope.len_lines().saturating_sub(1);
        self.cursor.row = self.cursor.row.min(max_row);
        self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.row));
    }

    /// Ensure the viewport keeps the cursor visible.
    pub fn scroll_to_cursor(&mut self) {
        let height = (self.viewport.height as usize).max(1);
        let off = (self.viewport.scroll_off as usize).min((height - 1) / 2);

        if self.cursor.row < self.viewport.top_line + off {
            self.viewport.top_line = self.cursor.row.saturating_sub(off);
        }
        if self.cursor.row + off >= self.viewport.top_line + height {
            self.viewport.top_line = self.cursor.row + off + 1 - height;
        }
    }
}

#[cfg(test)]
impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.set_text(text);
        buf
    }
}
