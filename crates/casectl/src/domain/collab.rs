//! Interfaces of the external collaborators the pipeline drives.
//!
//! Production implementations live in [`crate::infra`]; tests substitute
//! in-memory fakes. Everything here is object-safe so the pipeline can hold
//! collaborators as `Arc<dyn Trait>`.

use std::path::Path;

use anyhow::Result;

use crate::domain::model::{LaunchReport, RunConfiguration, TestDocument};

/// Source of test-definition documents.
pub trait DocumentSource: Send + Sync {
    /// Flush any unsaved edits for `path`, then return a snapshot of its
    /// text. Offsets in the snapshot must match what an external runner
    /// will read from disk.
    fn snapshot(&self, path: &Path) -> Result<TestDocument>;
}

/// How a dependency rebuild ended, as signalled by the build system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Completed,
    Cancelled,
}

/// One-shot continuation fired when a rebuild finishes.
pub type RebuildListener = Box<dyn FnOnce(RebuildOutcome) + Send>;

/// The build system that owns the invocation targets.
pub trait BuildSystem: Send + Sync {
    /// Register a listener fired exactly once when the next rebuild
    /// finishes. A listener registered before [`BuildSystem::request_rebuild`]
    /// must not miss that rebuild's completion signal.
    fn subscribe(&self, listener: RebuildListener);

    /// Kick off a dependency rebuild and return without waiting for it.
    fn request_rebuild(&self, force: bool);
}

/// Store of named run configurations.
pub trait ConfigurationStore: Send + Sync {
    fn find(&self, name: &str) -> Option<RunConfiguration>;

    /// Insert or overwrite a configuration under its name.
    fn upsert(&self, configuration: RunConfiguration);

    /// Mark a configuration as the active selection for subsequent runs.
    fn set_active(&self, name: &str);

    fn active(&self) -> Option<String>;
}

/// Dispatches run configurations for execution.
pub trait ExecutionHost: Send + Sync {
    fn execute(&self, configuration: &RunConfiguration) -> Result<LaunchReport>;
    fn debug(&self, configuration: &RunConfiguration) -> Result<LaunchReport>;
}

/// User-visible output surface for pipeline diagnostics.
pub trait Console: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Maps a local document path into the form the runner expects to receive.
pub trait PathMapper: Send + Sync {
    fn to_runner_path(&self, local: &Path) -> Result<String>;
}
