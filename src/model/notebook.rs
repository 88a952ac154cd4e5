use super::storage::Persistence;
use super::topic::{AppState, Topic, TopicId, UNTITLED};

/// The topic repository: in-memory state plus the persistence it writes through.
///
/// Every mutation persists the full snapshot before returning. Write failures
/// are logged and otherwise ignored.
pub struct Notebook {
    state: AppState,
    persistence: Persistence,
}

impl Notebook {
    /// Open the notebook, starting empty when nothing usable is stored.
    pub fn open(persistence: Persistence) -> Self {
        let state = persistence.load().unwrap_or_default();
        tracing::info!(
            key = persistence.key(),
            topics = state.topics.len(),
            "notebook loaded"
        );
        Self { state, persistence }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn find_active(&self) -> Option<&Topic> {
        self.state.find_active()
    }

    pub fn active_id(&self) -> Option<&TopicId> {
        self.state.active_id.as_ref()
    }

    /// The active topic, creating and activating an empty one if there is none.
    pub fn ensure_active(&mut self, now: i64) -> &mut Topic {
        let idx = match self.state.active_index() {
            Some(idx) => idx,
            None => {
                self.insert_front(Topic::new(now));
                self.persist();
                0
            }
        };
        &mut self.state.topics[idx]
    }

    /// Always creates a new empty topic and makes it active.
    pub fn create_new(&mut self, now: i64) -> &mut Topic {
        self.insert_front(Topic::new(now));
        self.persist();
        &mut self.state.topics[0]
    }

    /// Removes a topic. When it was active, the first remaining topic in
    /// `topics` order becomes active (or none).
    pub fn delete(&mut self, id: &TopicId) -> bool {
        let before = self.state.topics.len();
        self.state.topics.retain(|t| &t.id != id);
        if self.state.topics.len() == before {
            return false;
        }

        if self.state.active_id.as_ref() == Some(id) {
            self.state.active_id = self.state.topics.first().map(|t| t.id.clone());
        }

        tracing::info!(%id, "topic deleted");
        self.persist();
        true
    }

    /// Makes an existing topic active.
    pub fn select(&mut self, id: &TopicId) -> bool {
        if !self.state.contains(id) {
            return false;
        }
        self.state.active_id = Some(id.clone());
        self.persist();
        true
    }

    /// Writes the editing surfaces into the active topic (creating one if needed).
    pub fn commit(&mut self, title: &str, note: &str, now: i64) -> &Topic {
        let topic = self.ensure_active(now);
        topic.title = title.to_string();
        topic.note = note.to_string();
        topic.updated_at = now;
        let id = topic.id.clone();

        tracing::debug!(%id, chars = note.chars().count(), "topic committed");
        self.state.active_id = Some(id);
        self.persist();

        let idx = self.state.active_index().unwrap_or(0);
        &self.state.topics[idx]
    }

    /// Resets the active topic's title to the placeholder.
    pub fn reset_title(&mut self, now: i64) -> &Topic {
        let topic = self.ensure_active(now);
        topic.title = UNTITLED.to_string();
        topic.updated_at = now;
        self.persist();

        let idx = self.state.active_index().unwrap_or(0);
        &self.state.topics[idx]
    }

    fn insert_front(&mut self, topic: Topic) {
        tracing::info!(id = %topic.id, "topic created");
        self.state.active_id = Some(topic.id.clone());
        self.state.topics.insert(0, topic);
    }

    fn persist(&mut self) {
        if let Err(e) = self.persistence.save(&self.state) {
            tracing::error!("save failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::storage::{DEFAULT_STORAGE_KEY, KeyValueStore, MemoryStore, StorageError};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shares its slots with the test so writes can be inspected.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.borrow_mut().set(key, value)
        }
    }

    fn notebook() -> (Notebook, SharedStore) {
        let store = SharedStore::default();
        let persistence = Persistence::new(Box::new(store.clone()), DEFAULT_STORAGE_KEY);
        (Notebook::open(persistence), store)
    }

    fn stored(store: &SharedStore) -> AppState {
        Persistence::new(Box::new(store.clone()), DEFAULT_STORAGE_KEY)
            .load()
            .unwrap()
    }

    fn assert_pointer_valid(nb: &Notebook) {
        if let Some(id) = nb.active_id() {
            assert!(nb.state().contains(id), "dangling active id {id}");
        }
    }

    #[test]
    fn ensure_active_creates_once() {
        let (mut nb, store) = notebook();
        assert!(nb.find_active().is_none());

        let id = nb.ensure_active(10).id.clone();
        assert_eq!(nb.state().topics.len(), 1);
        assert_eq!(nb.find_active().unwrap().title, "Untitled");
        assert_eq!(nb.find_active().unwrap().updated_at, 10);
        assert_eq!(stored(&store), *nb.state());

        assert_eq!(nb.ensure_active(20).id, id);
        assert_eq!(nb.state().topics.len(), 1);
    }

    #[test]
    fn create_new_always_creates_at_front() {
        let (mut nb, _) = notebook();
        let first = nb.create_new(1).id.clone();
        let second = nb.create_new(2).id.clone();

        assert_ne!(first, second);
        assert_eq!(nb.state().topics[0].id, second);
        assert_eq!(nb.active_id(), Some(&second));
    }

    #[test]
    fn delete_reassigns_to_first_remaining() {
        let (mut nb, _) = notebook();
        let c = nb.create_new(1).id.clone();
        let b = nb.create_new(2).id.clone();
        let a = nb.create_new(3).id.clone();
        assert_eq!(nb.active_id(), Some(&a));

        assert!(nb.delete(&a));
        assert_eq!(nb.active_id(), Some(&b));

        assert!(nb.delete(&b));
        assert_eq!(nb.active_id(), Some(&c));

        assert!(nb.delete(&c));
        assert_eq!(nb.active_id(), None);
        assert!(nb.state().topics.is_empty());
    }

    #[test]
    fn delete_follows_topics_order_not_recency() {
        let (mut nb, _) = notebook();
        let old = nb.create_new(1).id.clone();
        let newer = nb.create_new(2).id.clone();
        let gone = nb.create_new(3).id.clone();

        // Editing the oldest topic bumps its timestamp but not its position.
        nb.select(&old);
        nb.commit("old", "edited", 50);
        nb.select(&gone);

        assert!(nb.delete(&gone));
        assert_eq!(nb.state().topics[0].id, newer);
        assert_eq!(nb.active_id(), Some(&newer));
        assert!(nb.state().contains(&old));
    }

    #[test]
    fn deleting_inactive_topic_keeps_pointer() {
        let (mut nb, store) = notebook();
        let other = nb.create_new(1).id.clone();
        let active = nb.create_new(2).id.clone();

        assert!(nb.delete(&other));
        assert_eq!(nb.active_id(), Some(&active));
        assert_eq!(stored(&store).topics.len(), 1);
    }

    #[test]
    fn deleting_unknown_id_is_a_no_op() {
        let (mut nb, _) = notebook();
        nb.create_new(1);
        let before = nb.state().clone();
        assert!(!nb.delete(&TopicId("nope".into())));
        assert_eq!(*nb.state(), before);
    }

    #[test]
    fn pointer_stays_valid_across_mixed_operations() {
        let (mut nb, _) = notebook();
        let mut ids = Vec::new();
        for step in 0..12i64 {
            match step % 4 {
                0 | 1 => ids.push(nb.create_new(step).id.clone()),
                2 => {
                    let id = ids.remove(0);
                    nb.delete(&id);
                }
                _ => {
                    nb.ensure_active(step);
                }
            }
            assert_pointer_valid(&nb);
        }
        while let Some(id) = nb.state().topics.first().map(|t| t.id.clone()) {
            nb.delete(&id);
            assert_pointer_valid(&nb);
        }
        assert_eq!(nb.active_id(), None);
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let (mut nb, _) = notebook();
        let a = nb.create_new(1).id.clone();
        let b = nb.create_new(2).id.clone();

        assert!(nb.select(&a));
        assert_eq!(nb.active_id(), Some(&a));
        assert!(!nb.select(&TopicId("ghost".into())));
        assert_eq!(nb.active_id(), Some(&a));
        assert!(nb.state().contains(&b));
    }

    #[test]
    fn commit_creates_topic_when_none_active() {
        let (mut nb, store) = notebook();
        let topic = nb.commit("Plan", "step one", 99);
        assert_eq!(topic.title, "Plan");
        assert_eq!(topic.note, "step one");
        assert_eq!(topic.updated_at, 99);

        let saved = stored(&store);
        assert_eq!(saved.find_active().map(|t| t.note.as_str()), Some("step one"));
    }

    #[test]
    fn commit_keeps_empty_title() {
        let (mut nb, _) = notebook();
        let topic = nb.commit("", "body", 5);
        assert_eq!(topic.title, "");
        assert_eq!(topic.display_title(), "Untitled");
    }

    #[test]
    fn reset_title_persists_placeholder() {
        let (mut nb, store) = notebook();
        nb.commit("  ", "body", 1);
        let topic = nb.reset_title(7);
        assert_eq!(topic.title, "Untitled");
        assert_eq!(topic.updated_at, 7);
        assert_eq!(topic.note, "body");
        assert_eq!(stored(&store).topics[0].title, "Untitled");
    }

    #[test]
    fn write_failures_do_not_break_the_notebook() {
        let store = SharedStore::default();
        store.0.borrow_mut().fail_writes = true;
        let mut nb = Notebook::open(Persistence::new(Box::new(store.clone()), DEFAULT_STORAGE_KEY));

        nb.commit("kept in memory", "", 1);
        assert_eq!(nb.state().topics.len(), 1);
        assert!(store.0.borrow().slots.is_empty());
    }

    #[test]
    fn reopening_restores_state() {
        let (mut nb, store) = notebook();
        nb.commit("Persisted", "body", 3);
        let expected = nb.state().clone();

        let reopened = Notebook::open(Persistence::new(Box::new(store), DEFAULT_STORAGE_KEY));
        assert_eq!(*reopened.state(), expected);
    }
}
