use crossterm::event::KeyEvent;

use crate::model::detail::Field;
use crate::model::topic::TopicId;

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    LineStart,
    LineEnd,
}

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Topic commands
    NewTopic,
    SelectTopic(TopicId),
    RequestDelete(TopicId),
    ConfirmDelete,
    CancelDelete,

    // -- Editing commands
    FocusField(Option<Field>),
    FieldChanged(Field),
    InsertBullet,
    InsertTodo,
    ToggleTodo,
    SetSearch(String),

    // -- System
    Tick,
    Quit,
}
