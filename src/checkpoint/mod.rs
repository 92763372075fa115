//! Durable snapshots of a [`Session`], keyed by session name.
//!
//! A checkpoint is persisted as one JSON document per key:
//!
//! ```json
//! {
//!   "progress": { "cursor": 20, "total": 57, "percentage": 35, "estimatedTime": "3m 4s" },
//!   "results":  [ { "username": "alice", "post_date": "2024-01-05", "error": false } ]
//! }
//! ```

#[cfg(test)]
pub(crate) mod memory;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::session::{ItemResult, Session, format_eta};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("checkpoint IO error: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Progress header of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(alias = "current")]
    pub cursor: usize,
    pub total: usize,
    pub percentage: u32,
    #[serde(default)]
    pub estimated_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub progress: Progress,
    #[serde(default)]
    pub results: Vec<ItemResult>,
}

impl Checkpoint {
    pub fn from_session(session: &Session, eta: Option<Duration>) -> Self {
        Self {
            progress: Progress {
                cursor: session.cursor,
                total: session.total,
                percentage: session.percentage(),
                estimated_time: eta.map(format_eta).unwrap_or_default(),
            },
            results: session.results.clone(),
        }
    }

    pub fn into_session(self) -> Session {
        Session {
            cursor: self.progress.cursor,
            total: self.progress.total,
            results: self.results,
        }
    }
}

/// Storage for checkpoints. A single writer per key is assumed; no locking across processes.
pub trait CheckpointStore {
    fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), StorageError>;

    fn load(&self, key: &str) -> Result<Option<Checkpoint>, StorageError>;

    /// Removing a key that does not exist is not an error.
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores each checkpoint as `<dir>/<key>.json`, replaced atomically via rename.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

// Keys become file names; anything outside [A-Za-z0-9_-] is replaced.
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let json = serde_json::to_vec_pretty(checkpoint)?;
        write_atomically(&path, &json)?;
        debug!(path = %path.display(), cursor = checkpoint.progress.cursor, "checkpoint saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Checkpoint>, StorageError> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        let mut session = Session::new(3);
        session.record(ItemResult::success("alice", "2024-01-05"));
        session.record(ItemResult::failure("carol", "Error: User not found"));
        session
    }

    #[test]
    fn save_then_load_restores_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("state"));
        let checkpoint = Checkpoint::from_session(&sample_session(), Some(Duration::from_secs(65)));

        store.save("default", &checkpoint).unwrap();
        let loaded = store.load("default").unwrap().unwrap();

        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.progress.percentage, 67);
        assert_eq!(loaded.progress.estimated_time, "1m 5s");
        assert_eq!(loaded.into_session(), sample_session());
    }

    #[test]
    fn resaving_a_loaded_checkpoint_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store
            .save("k", &Checkpoint::from_session(&sample_session(), None))
            .unwrap();
        let first = fs::read(store.path_for("k")).unwrap();

        let loaded = store.load("k").unwrap().unwrap();
        store.save("k", &loaded).unwrap();

        assert_eq!(fs::read(store.path_for("k")).unwrap(), first);
    }

    #[test]
    fn missing_checkpoint_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert!(store.load("nothing").unwrap().is_none());
    }

    #[test]
    fn clear_removes_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store
            .save("k", &Checkpoint::from_session(&sample_session(), None))
            .unwrap();

        store.clear("k").unwrap();
        assert!(store.load("k").unwrap().is_none());
        store.clear("k").unwrap();
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        fs::write(store.path_for("k"), "{not json").unwrap();
        assert!(matches!(store.load("k"), Err(StorageError::Json(_))));
    }

    #[test]
    fn reads_legacy_current_field() {
        let json = r#"{
            "progress": {"current": 1, "total": 2, "percentage": 50},
            "results": [{"username": "alice", "post_date": "No posts found", "error": false}]
        }"#;
        let checkpoint: Checkpoint = serde_json::from_str(json).unwrap();
        assert_eq!(checkpoint.progress.cursor, 1);
        assert_eq!(checkpoint.progress.estimated_time, "");
        assert!(checkpoint.into_session().is_consistent());
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let store = FileCheckpointStore::new("/tmp/x");
        assert_eq!(store.path_for("../evil key").file_name().unwrap(), "___evil_key.json");
        assert_eq!(store.path_for("").file_name().unwrap(), "default.json");
    }
}
