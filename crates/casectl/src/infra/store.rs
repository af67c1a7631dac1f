//! Persistence of run configurations.
//!
//! Configurations live in one JSON document under the workspace's
//! `.casectl/` directory so they survive across invocations the same way an
//! IDE's run-configuration list does.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::collab::ConfigurationStore;
use crate::domain::model::{InvocationTarget, RunConfiguration};

const STORE_DIR: &str = ".casectl";
const STORE_FILE: &str = "configurations.json";

/// Serialized form of one stored run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub name: String,
    pub build_target: String,
    #[serde(default)]
    pub profile: Option<String>,
    pub executable: PathBuf,
    #[serde(default)]
    pub program_args: String,
}

impl From<&RunConfiguration> for ConfigurationRecord {
    fn from(configuration: &RunConfiguration) -> Self {
        Self {
            name: configuration.name.clone(),
            build_target: configuration.target.build_target.clone(),
            profile: configuration.target.profile.clone(),
            executable: configuration.target.executable.clone(),
            program_args: configuration.program_args.clone(),
        }
    }
}

impl ConfigurationRecord {
    fn into_configuration(self) -> RunConfiguration {
        RunConfiguration {
            name: self.name,
            target: InvocationTarget {
                build_target: self.build_target,
                profile: self.profile,
                executable: self.executable,
            },
            program_args: self.program_args,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    configurations: Vec<ConfigurationRecord>,
    #[serde(default)]
    active: Option<String>,
}

/// File-backed configuration store rooted in a workspace directory.
pub struct FileStore {
    path: PathBuf,
    configurations: DashMap<String, RunConfiguration>,
    active: Mutex<Option<String>>,
}

impl FileStore {
    /// Open the store under `root/.casectl/`, creating it lazily on first
    /// write.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let path = root.into().join(STORE_DIR).join(STORE_FILE);
        let store = Self {
            path,
            configurations: DashMap::new(),
            active: Mutex::new(None),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        for record in snapshot.configurations {
            let configuration = record.into_configuration();
            self.configurations
                .insert(configuration.name.clone(), configuration);
        }
        *self.active.lock() = snapshot.active;
        Ok(())
    }

    /// Write the current state back to disk. Persistence failures are
    /// logged and swallowed; the in-memory state stays authoritative for
    /// the rest of the run.
    fn persist(&self) {
        let mut records: Vec<ConfigurationRecord> = self
            .configurations
            .iter()
            .map(|entry| ConfigurationRecord::from(entry.value()))
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        let snapshot = StoreSnapshot {
            configurations: records,
            active: self.active.lock().clone(),
        };

        let result = serde_json::to_string_pretty(&snapshot)
            .context("failed to serialize run configurations")
            .and_then(|data| {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(&self.path, data)
                    .with_context(|| format!("failed to write {}", self.path.display()))
            });
        if let Err(err) = result {
            warn!(error = %err, "run configurations were not persisted");
        }
    }
}

impl ConfigurationStore for FileStore {
    fn find(&self, name: &str) -> Option<RunConfiguration> {
        self.configurations.get(name).map(|entry| entry.value().clone())
    }

    fn upsert(&self, configuration: RunConfiguration) {
        self.configurations
            .insert(configuration.name.clone(), configuration);
        self.persist();
    }

    fn set_active(&self, name: &str) {
        *self.active.lock() = Some(name.to_owned());
        self.persist();
    }

    fn active(&self) -> Option<String> {
        self.active.lock().clone()
    }
}

/// Purely in-memory store for tests and embedders with their own
/// persistence.
#[derive(Default)]
pub struct MemoryStore {
    configurations: DashMap<String, RunConfiguration>,
    active: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigurationStore for MemoryStore {
    fn find(&self, name: &str) -> Option<RunConfiguration> {
        self.configurations.get(name).map(|entry| entry.value().clone())
    }

    fn upsert(&self, configuration: RunConfiguration) {
        self.configurations
            .insert(configuration.name.clone(), configuration);
    }

    fn set_active(&self, name: &str) {
        *self.active.lock() = Some(name.to_owned());
    }

    fn active(&self) -> Option<String> {
        self.active.lock().clone()
    }
}
