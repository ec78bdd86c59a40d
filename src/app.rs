//! Application shell: the one place that owns the store and its storage.

use crate::storage::{KeyValueStore, load_state, persist};
use crate::store::{Action, Store};

pub struct QuestLog<S: KeyValueStore> {
    store: Store,
    storage: S,
    key: String,
}

impl<S: KeyValueStore> QuestLog<S> {
    /// Loads the saved state (or defaults) from `storage` under `key`.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = load_state(&storage, &key);
        tracing::info!(
            key = %key,
            groups = state.groups.len(),
            quests = state.quests.len(),
            "quest log opened"
        );
        Self {
            store: Store::new(state),
            storage,
            key,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Applies `action` and saves the new state if it changed. Save failures
    /// are logged by [`persist`] and do not undo the change.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let name = action.name();
        let changed = self.store.dispatch(action);
        if changed {
            tracing::debug!(action = name, "state changed");
            persist(&mut self.storage, &self.key, self.store.state());
        }
        changed
    }

    /// Writes the current state even if nothing changed.
    pub fn save(&mut self) -> bool {
        persist(&mut self.storage, &self.key, self.store.state())
    }
}
