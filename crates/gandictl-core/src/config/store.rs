//! Local record of machines created through gandictl
//!
//! Stored as `machines.toml` next to the config file, one table per machine:
//!
//! ```toml
//! [machines.web-1]
//! vm_id = 4242
//! ip_address = "192.0.2.7"
//!
//! [machines.web-1.config]
//! name = "web-1"
//! datacenter = "LU-BI1"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::driver::MachineRecord;

const STORE_FILE_NAME: &str = "machines.toml";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MachineStore {
    #[serde(default)]
    machines: BTreeMap<String, MachineRecord>,
}

impl MachineStore {
    /// Store location for a given config file path
    pub fn path_for(config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) => dir.join(STORE_FILE_NAME),
            None => PathBuf::from(STORE_FILE_NAME),
        }
    }

    /// Load the store; a missing file is an empty store
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::SaveError {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn get(&self, name: &str) -> Result<&MachineRecord> {
        self.machines
            .get(name)
            .ok_or_else(|| ConfigError::MachineNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.machines.contains_key(name)
    }

    /// Insert or replace the record keyed by its machine name
    pub fn insert(&mut self, record: MachineRecord) {
        self.machines.insert(record.name().to_string(), record);
    }

    pub fn remove(&mut self, name: &str) -> Option<MachineRecord> {
        self.machines.remove(name)
    }

    /// Records sorted by machine name
    pub fn list(&self) -> impl Iterator<Item = &MachineRecord> {
        self.machines.values()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}
