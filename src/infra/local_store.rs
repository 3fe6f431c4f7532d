//! Client-local key/value state kept between runs.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::application::repos::{LocalState, LocalStateError};
use crate::util::lock::mutex_lock;

const STATE_FILE: &str = "state.json";

/// JSON map stored at `<state_dir>/state.json`, rewritten atomically on change.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStateStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(STATE_FILE),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, LocalStateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| LocalStateError::Corrupt(err.to_string()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), LocalStateError> {
        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        serde_json::to_writer_pretty(&mut tmp, map)
            .map_err(|err| LocalStateError::Corrupt(err.to_string()))?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), keys = map.len(), "Wrote local state");
        Ok(())
    }
}

impl LocalState for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStateError> {
        let _guard = mutex_lock(&self.guard, "infra::local_store", "get");
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStateError> {
        let _guard = mutex_lock(&self.guard, "infra::local_store", "set");
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), LocalStateError> {
        let _guard = mutex_lock(&self.guard, "infra::local_store", "remove");
        let mut map = self.read_map()?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map)
    }

    fn reset(&self) -> Result<(), LocalStateError> {
        let _guard = mutex_lock(&self.guard, "infra::local_store", "reset");
        self.write_map(&BTreeMap::new())
    }
}

/// In-process state for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryState {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalState for MemoryState {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStateError> {
        Ok(mutex_lock(&self.values, "infra::local_store", "memory_get")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStateError> {
        mutex_lock(&self.values, "infra::local_store", "memory_set")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStateError> {
        mutex_lock(&self.values, "infra::local_store", "memory_remove").remove(key);
        Ok(())
    }

    fn reset(&self) -> Result<(), LocalStateError> {
        mutex_lock(&self.values, "infra::local_store", "memory_reset").clear();
        Ok(())
    }
}
