use std::collections::HashMap;
use std::sync::Mutex;

use super::{Checkpoint, CheckpointStore, StorageError};

/// In-memory store that also counts writes, for controller tests.
#[derive(Default)]
pub(crate) struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, Checkpoint>>,
    saves: Mutex<Vec<usize>>,
    clears: Mutex<usize>,
}

impl MemoryCheckpointStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Checkpoint> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: &str, checkpoint: Checkpoint) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), checkpoint);
    }

    /// Cursor of every save, in order.
    pub(crate) fn saved_cursors(&self) -> Vec<usize> {
        self.saves.lock().unwrap().clone()
    }

    pub(crate) fn clear_count(&self) -> usize {
        *self.clears.lock().unwrap()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        self.saves.lock().unwrap().push(checkpoint.progress.cursor);
        self.insert(key, checkpoint.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Checkpoint>, StorageError> {
        Ok(self.get(key))
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        *self.clears.lock().unwrap() += 1;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
