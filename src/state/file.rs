//! YAML-file backed state store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ipnet::Ipv4Net;
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use super::{AllocationState, StateSection, StateStore};
use crate::error::{FabricError, Result};

/// State store persisted as a YAML document.
///
/// A missing, unreadable or corrupt file is treated as empty state so a
/// damaged file never blocks planning; the condition is logged at `warn`.
/// Nothing touches the file until [`StateStore::persist`] is called, and
/// persisting replaces the file atomically.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: AllocationState,
}

impl FileStateStore {
    /// Open the store at `path`, loading whatever valid state it holds
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = load_state(&path);
        info!(
            "Opened allocation state {} ({} recorded assignments)",
            path.display(),
            state.len()
        );
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }
}

fn load_state(path: &Path) -> AllocationState {
    if !path.exists() {
        debug!("No state file at {}, starting empty", path.display());
        return AllocationState::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read state file {}: {}; treating as empty", path.display(), e);
            return AllocationState::default();
        }
    };

    if content.trim().is_empty() {
        return AllocationState::default();
    }

    match serde_yaml::from_str::<Option<AllocationState>>(&content) {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            warn!("State file {} is corrupt: {}; treating as empty", path.display(), e);
            AllocationState::default()
        }
    }
}

impl StateStore for FileStateStore {
    fn get(&self, section: StateSection, key: &str) -> Option<Ipv4Net> {
        self.state.get(section, key)
    }

    fn put(&mut self, section: StateSection, key: &str, value: Ipv4Net) {
        self.state.insert(section, key, value);
    }

    fn claimed(&self) -> Vec<(StateSection, String, Ipv4Net)> {
        self.state.entries()
    }

    fn persist(&mut self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.state)
            .map_err(|e| FabricError::State(format!("failed to serialize state: {}", e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| FabricError::State(format!("failed to replace {}: {}", self.path.display(), e)))?;

        info!(
            "Persisted {} assignments to {}",
            self.state.len(),
            self.path.display()
        );
        Ok(())
    }
}
