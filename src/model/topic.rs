use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown (and assigned to fresh topics) when a title is empty.
pub const UNTITLED: &str = "Untitled";

/// Opaque topic identifier. Any string is accepted from storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub String);

impl TopicId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: i64,
}

impl Topic {
    /// A fresh, empty topic with a newly generated id.
    pub fn new(now: i64) -> Self {
        Self {
            id: TopicId::generate(),
            title: UNTITLED.to_string(),
            note: String::new(),
            updated_at: now,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

/// Everything that gets persisted: the topics plus the active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub active_id: Option<TopicId>,
}

impl AppState {
    pub fn find(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.find(id).is_some()
    }

    pub fn find_active(&self) -> Option<&Topic> {
        let id = self.active_id.as_ref()?;
        self.find(id)
    }

    pub(crate) fn active_index(&self) -> Option<usize> {
        let id = self.active_id.as_ref()?;
        self.topics.iter().position(|t| &t.id == id)
    }

    /// Clears an active pointer that no longer references a topic.
    /// Returns true when something had to be fixed.
    pub fn repair_active(&mut self) -> bool {
        if self.active_id.is_some() && self.active_index().is_none() {
            self.active_id = None;
            return true;
        }
        false
    }
}
