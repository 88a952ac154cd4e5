use super::detail::Field;

/// Application interaction modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Topic list navigation and commands.
    #[default]
    Normal,
    /// Editing the active topic's title.
    EditTitle,
    /// Editing the active topic's note.
    EditNote,
    /// Typing into the search box.
    Search,
    /// Waiting for y/n before deleting a topic.
    ConfirmDelete,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "LIST",
            Mode::EditTitle => "TITLE",
            Mode::EditNote => "NOTE",
            Mode::Search => "SEARCH",
            Mode::ConfirmDelete => "DELETE",
        }
    }

    /// The detail field that has keyboard focus in this mode.
    pub fn focused_field(&self) -> Option<Field> {
        match self {
            Mode::EditTitle => Some(Field::Title),
            Mode::EditNote => Some(Field::Note),
            _ => None,
        }
    }
}
