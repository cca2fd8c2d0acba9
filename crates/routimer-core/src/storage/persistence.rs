//! Best-effort gateway between the engine and a [`KeyValueStore`].
//!
//! Every call here swallows failures: reads degrade to empty defaults and
//! writes log a warning. Timer correctness never depends on a single write.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::settings::Settings;
use super::store::KeyValueStore;
use crate::group::{Group, GroupCatalog};
use crate::timer::TimerCheckpoint;

pub const GROUPS_KEY: &str = "routimer.groups";
pub const SETTINGS_KEY: &str = "routimer.settings";
pub const CHECKPOINT_KEY: &str = "routimer.timerState";

pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_groups(&self) -> GroupCatalog {
        GroupCatalog::new(self.read::<Vec<Group>>(GROUPS_KEY).unwrap_or_default())
    }

    pub fn save_groups(&self, catalog: &GroupCatalog) {
        self.write(GROUPS_KEY, catalog);
    }

    pub fn load_settings(&self) -> Settings {
        self.read(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save_settings(&self, settings: &Settings) {
        self.write(SETTINGS_KEY, settings);
    }

    pub fn load_checkpoint(&self) -> Option<TimerCheckpoint> {
        self.read(CHECKPOINT_KEY)
    }

    pub fn save_checkpoint(&self, checkpoint: &TimerCheckpoint) {
        self.write(CHECKPOINT_KEY, checkpoint);
    }

    pub fn clear_checkpoint(&self) {
        if let Err(e) = self.store.remove(CHECKPOINT_KEY) {
            warn!(key = CHECKPOINT_KEY, "failed to clear checkpoint: {e}");
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, "failed to read from store: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "ignoring unreadable stored value: {e}");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, "failed to serialize value: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &json) {
            warn!(key, "failed to write to store: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::group::{NotifyPolicy, Task};
    use crate::storage::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Locked)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Locked)
        }
        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Locked)
        }
    }

    fn checkpoint() -> TimerCheckpoint {
        TimerCheckpoint {
            group_id: "g1".into(),
            task_index: 2,
            paused: false,
            remaining_ms: 10_000,
            task_duration_ms: 30_000,
            last_tick_epoch_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn groups_round_trip() {
        let p = Persistence::new(MemoryStore::new());
        let mut catalog = GroupCatalog::default();
        catalog.insert(
            Group::new("Stretch").with_task(Task::new("Neck", 30_000, NotifyPolicy::Both)),
        );
        p.save_groups(&catalog);
        assert_eq!(p.load_groups(), catalog);
    }

    #[test]
    fn checkpoint_save_load_clear() {
        let store = MemoryStore::new();
        let p = Persistence::new(store.clone());
        assert!(p.load_checkpoint().is_none());
        p.save_checkpoint(&checkpoint());
        assert_eq!(p.load_checkpoint(), Some(checkpoint()));
        p.clear_checkpoint();
        assert!(!store.contains(CHECKPOINT_KEY));
    }

    #[test]
    fn corrupt_values_degrade_to_defaults() {
        let store = MemoryStore::new();
        store.set(GROUPS_KEY, "not json").unwrap();
        store.set(SETTINGS_KEY, "[1,2,3]").unwrap();
        store.set(CHECKPOINT_KEY, r#"{"groupId":"g1"}"#).unwrap();
        let p = Persistence::new(store);
        assert!(p.load_groups().is_empty());
        assert_eq!(p.load_settings(), Settings::default());
        assert!(p.load_checkpoint().is_none());
    }

    #[test]
    fn store_failures_are_swallowed() {
        let p = Persistence::new(BrokenStore);
        p.save_checkpoint(&checkpoint());
        p.clear_checkpoint();
        p.save_groups(&GroupCatalog::default());
        assert!(p.load_checkpoint().is_none());
        assert!(p.load_groups().is_empty());
    }
}
