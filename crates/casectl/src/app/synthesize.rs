//! Deriving the per-case run configuration from the base configuration.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::debug;

use crate::app::args::ArgumentBuilder;
use crate::domain::collab::{ConfigurationStore, PathMapper};
use crate::domain::errors::InvocationError;
use crate::domain::model::{InvocationRequest, RunConfiguration};

/// Projects a (base configuration, request) pair onto the single derived
/// configuration and marks it active.
///
/// There is exactly one derived configuration per store, reused across
/// requests. The read-translate-write sequence runs under a lock so that
/// concurrent requests cannot interleave and produce a configuration mixing
/// two of them.
pub struct ConfigSynthesizer {
    store: Arc<dyn ConfigurationStore>,
    mapper: Arc<dyn PathMapper>,
    arguments: ArgumentBuilder,
    derived_name: String,
    slot: Mutex<()>,
}

impl ConfigSynthesizer {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        mapper: Arc<dyn PathMapper>,
        arguments: ArgumentBuilder,
        derived_name: String,
    ) -> Self {
        Self {
            store,
            mapper,
            arguments,
            derived_name,
            slot: Mutex::new(()),
        }
    }

    /// Rebuild the derived configuration from the base configuration's
    /// current state and `request`, register it, and select it.
    ///
    /// The base is re-read inside the critical section, so the derived
    /// configuration always reflects the base's target and arguments as of
    /// this call.
    pub fn synthesize(
        &self,
        base_name: &str,
        request: &InvocationRequest,
    ) -> Result<RunConfiguration> {
        let _guard = self.slot.lock();

        let base = self.store.find(base_name).ok_or_else(|| {
            InvocationError::ConfigurationNotFound {
                name: base_name.to_string(),
            }
        })?;
        let runner_path = self.mapper.to_runner_path(&request.path)?;
        let program_args = self
            .arguments
            .build(&base.program_args, &runner_path, request.case);

        let derived = RunConfiguration {
            name: self.derived_name.clone(),
            target: base.target,
            program_args,
        };
        self.store.upsert(derived.clone());
        self.store.set_active(&self.derived_name);
        debug!(
            configuration = %derived.name,
            args = %derived.program_args,
            "derived configuration updated"
        );
        Ok(derived)
    }
}
