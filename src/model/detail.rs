use super::buffer::Buffer;
use super::topic::{Topic, UNTITLED};
use crate::util::format_timestamp;

/// The two editable fields of the detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Saved,
    Saving,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Saved => "Saved locally",
            SaveStatus::Saving => "Saving...",
        }
    }
}

/// Editing surfaces and read-only metadata for the active topic.
#[derive(Debug, Clone, Default)]
pub struct DetailView {
    pub title: Buffer,
    pub note: Buffer,
    pub focus: Option<Field>,
    pub status: SaveStatus,
    top_title: String,
    char_count: usize,
    updated_at: Option<i64>,
    /// The next title keystroke replaces the whole title.
    title_selected: bool,
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            top_title: UNTITLED.to_string(),
            ..Default::default()
        }
    }

    /// Refresh from the active topic. A focused field keeps whatever the
    /// user is typing; everything else is overwritten.
    pub fn sync(&mut self, topic: Option<&Topic>) {
        self.top_title = topic.map_or(UNTITLED, Topic::display_title).to_string();

        if self.focus != Some(Field::Title) {
            self.title.set_text(topic.map_or("", |t| t.title.as_str()));
            self.title_selected = false;
        }
        if self.focus != Some(Field::Note) {
            self.note.set_text(topic.map_or("", |t| t.note.as_str()));
        }

        self.char_count = topic.map_or(0, |t| t.note.chars().count());
        self.updated_at = topic.map(|t| t.updated_at);
    }

    /// Metadata only; the field contents are left alone.
    pub fn refresh_meta(&mut self, topic: &Topic) {
        self.top_title = topic.display_title().to_string();
        self.updated_at = Some(topic.updated_at);
        self.recount();
    }

    pub fn mark_committed(&mut self, topic: &Topic) {
        self.refresh_meta(topic);
        self.status = SaveStatus::Saved;
    }

    /// Character count follows the note field live while typing.
    pub fn recount(&mut self) {
        self.char_count = self.note.len_chars();
    }

    pub fn top_title(&self) -> &str {
        &self.top_title
    }

    pub fn char_count_label(&self) -> String {
        format!("{} chars", self.char_count)
    }

    pub fn updated_label(&self) -> String {
        match self.updated_at {
            Some(ms) => format!("Updated: {}", format_timestamp(ms)),
            None => "—".to_string(),
        }
    }

    pub fn select_title(&mut self) {
        self.title_selected = true;
    }

    pub fn deselect_title(&mut self) {
        self.title_selected = false;
    }

    pub fn is_title_selected(&self) -> bool {
        self.title_selected
    }

    /// Consume the title selection, clearing the title if it was selected.
    pub fn take_title_selection(&mut self) -> bool {
        if !self.title_selected {
            return false;
        }
        self.title_selected = false;
        self.title.clear();
        true
    }

    pub fn buffer_mut(&mut self, field: Field) -> &mut Buffer {
        match field {
            Field::Title => &mut self.title,
            Field::Note => &mut self.note,
        }
    }
}
