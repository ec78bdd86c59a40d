use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::defaults::{default_groups, default_state};
use crate::types::{Quest, QuestGroup, State};

pub const DEFAULT_STORAGE_KEY: &str = "quest-log-v2";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage quota exceeded writing '{key}': {size} bytes over a {limit} byte limit")]
    QuotaExceeded {
        key: String,
        limit: usize,
        size: usize,
    },
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// Durable string key-value storage, the equivalent of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform data directory, falling back to a dot-directory in `$HOME`.
    pub fn default_root() -> Result<PathBuf, StorageError> {
        dirs::data_dir()
            .map(|dir| dir.join("quest-log"))
            .or_else(|| dirs::home_dir().map(|home| home.join(".quest-log")))
            .ok_or(StorageError::NoDataDir)
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes through a temporary file and an atomic rename to avoid partial
    /// writes.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(key);
        let temp = path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        f.write_all(value.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, &path)?;
        Ok(())
    }
}

/// In-process store with an optional total size quota.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            let size = self.used_without(key) + key.len() + value.len();
            if size > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    limit,
                    size,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persisted blob as read back. Absent keys keep their defaults on merge.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    groups: Option<Vec<QuestGroup>>,
    quests: Option<Vec<Quest>>,
    #[serde(default, deserialize_with = "present")]
    selected_quest_id: Option<Option<String>>,
    search_query: Option<String>,
}

/// Distinguishes `"key": null` (present, empty) from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Field-by-field merge of a persisted blob over `defaults`. A present field
/// always wins; afterwards any system-defined group missing from `groups` is
/// put back, so an empty persisted group list ends up as the default groups.
fn merge(mut defaults: State, persisted: PersistedState) -> State {
    if let Some(groups) = persisted.groups {
        defaults.groups = groups;
    }
    if let Some(quests) = persisted.quests {
        defaults.quests = quests;
    }
    if let Some(selected) = persisted.selected_quest_id {
        defaults.selected_quest_id = selected;
    }
    if let Some(query) = persisted.search_query {
        defaults.search_query = query;
    }

    for group in default_groups() {
        if !defaults.groups.iter().any(|g| g.id == group.id) {
            tracing::info!(group = %group.id, "restoring missing system group");
            defaults.groups.push(group);
        }
    }
    defaults
}

/// Reads the state stored under `key`, falling back to the default state when
/// nothing is stored or the blob cannot be read. Never fails.
pub fn load_state(store: &impl KeyValueStore, key: &str) -> State {
    load_state_at(store, key, Utc::now())
}

pub fn load_state_at(store: &impl KeyValueStore, key: &str, now: DateTime<Utc>) -> State {
    let defaults = default_state(now);
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::info!(key, "no saved quest log, starting from defaults");
            return defaults;
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read saved quest log, using defaults");
            return defaults;
        }
    };

    match serde_json::from_str::<PersistedState>(&raw) {
        Ok(persisted) => merge(defaults, persisted),
        Err(e) => {
            tracing::warn!(key, error = %e, "saved quest log is unreadable, using defaults");
            defaults
        }
    }
}

/// Serializes the full state under `key`.
pub fn save_state(
    store: &mut impl KeyValueStore,
    key: &str,
    state: &State,
) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(state)?;
    store.set(key, &content)
}

/// Best-effort save: failures are logged and the in-memory state is kept.
pub fn persist(store: &mut impl KeyValueStore, key: &str, state: &State) -> bool {
    match save_state(store, key, state) {
        Ok(()) => {
            tracing::debug!(key, quests = state.quests.len(), "quest log saved");
            true
        }
        Err(e) => {
            tracing::error!(key, error = %e, "failed to save quest log");
            false
        }
    }
}
