//! The invocation pipeline: snapshot, scan, resolve, synthesize, launch.
//!
//! Resolution is the only stateful part of the pipeline. When the base
//! configuration is missing the request is parked behind a dependency
//! rebuild and resumed exactly once from the rebuild's completion listener;
//! a request never triggers more than one rebuild.

use std::sync::Arc;
use std::sync::mpsc;

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::app::args::ArgumentBuilder;
use crate::app::launch::Launcher;
use crate::app::scan::SegmentScanner;
use crate::app::synthesize::ConfigSynthesizer;
use crate::domain::collab::{
    BuildSystem, ConfigurationStore, Console, DocumentSource, ExecutionHost, PathMapper,
    RebuildOutcome,
};
use crate::domain::errors::InvocationError;
use crate::domain::model::{InvocationRequest, LaunchReport};
use crate::infra::config::Settings;

/// External collaborators the pipeline drives, bundled for construction.
pub struct Collaborators {
    pub documents: Arc<dyn DocumentSource>,
    pub build: Arc<dyn BuildSystem>,
    pub store: Arc<dyn ConfigurationStore>,
    pub host: Arc<dyn ExecutionHost>,
    pub console: Arc<dyn Console>,
    pub mapper: Arc<dyn PathMapper>,
}

/// Where the pipeline left a request after one resolution attempt.
#[derive(Debug)]
pub enum Resolution {
    /// The launch was dispatched synchronously.
    Launched(LaunchReport),
    /// The base configuration was missing; a rebuild is underway and the
    /// pipeline resumes from its completion listener.
    Deferred(PendingInvocation),
}

/// Handle onto a request parked behind a dependency rebuild.
#[derive(Debug)]
pub struct PendingInvocation {
    receiver: mpsc::Receiver<Result<LaunchReport>>,
}

impl PendingInvocation {
    /// Block until the resumed pipeline reaches a terminal state.
    ///
    /// Failures on the resumed path have already been reported through the
    /// console by the time they arrive here.
    pub fn wait(self) -> Result<LaunchReport> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("rebuild completion listener was dropped before it fired")),
        }
    }
}

/// Runs invocation requests end to end.
///
/// Cloning is cheap; the continuation registered on the rebuild path carries
/// a clone of the whole invoker into the completion listener.
#[derive(Clone)]
pub struct Invoker {
    documents: Arc<dyn DocumentSource>,
    build: Arc<dyn BuildSystem>,
    store: Arc<dyn ConfigurationStore>,
    console: Arc<dyn Console>,
    scanner: SegmentScanner,
    synthesizer: Arc<ConfigSynthesizer>,
    launcher: Launcher,
    base_name: String,
}

impl Invoker {
    pub fn new(collaborators: Collaborators, settings: &Settings) -> Result<Self> {
        let arguments = ArgumentBuilder::from_config(settings)?;
        let synthesizer = Arc::new(ConfigSynthesizer::new(
            collaborators.store.clone(),
            collaborators.mapper,
            arguments,
            settings.runner.derived_configuration.clone(),
        ));
        let launcher = Launcher::new(collaborators.host, collaborators.console.clone());
        Ok(Self {
            documents: collaborators.documents,
            build: collaborators.build,
            store: collaborators.store,
            console: collaborators.console,
            scanner: SegmentScanner::new(),
            synthesizer,
            launcher,
            base_name: settings.runner.base_configuration.clone(),
        })
    }

    /// Run one request through the pipeline.
    ///
    /// Synchronous failures come back as `Err`; a missing base configuration
    /// comes back as [`Resolution::Deferred`] with the request parked behind
    /// a rebuild.
    pub fn invoke(&self, request: InvocationRequest) -> Result<Resolution> {
        debug!(
            path = %request.path.display(),
            case = request.case,
            debug = request.debug,
            "invocation requested"
        );

        let document = self.documents.snapshot(&request.path)?;
        let segments = self.scanner.scan(&document);
        if request.case > segments.case_count() {
            return Err(InvocationError::CaseOutOfRange {
                requested: request.case,
                available: segments.case_count(),
            }
            .into());
        }

        if self.store.find(&self.base_name).is_some() {
            return self.run_resolved(&request).map(Resolution::Launched);
        }
        Ok(Resolution::Deferred(self.defer_until_rebuilt(request)))
    }

    fn run_resolved(&self, request: &InvocationRequest) -> Result<LaunchReport> {
        let derived = self.synthesizer.synthesize(&self.base_name, request)?;
        self.launcher.launch(&derived, request.debug)
    }

    /// Park `request` behind a dependency rebuild.
    ///
    /// The listener is registered before the rebuild is requested, so a
    /// completion signal cannot slip through the gap between the two calls.
    fn defer_until_rebuilt(&self, request: InvocationRequest) -> PendingInvocation {
        self.console.error(&format!(
            "could not find the '{}' run configuration; rebuilding dependencies and retrying",
            self.base_name
        ));

        let (sender, receiver) = mpsc::channel();
        let invoker = self.clone();
        self.build.subscribe(Box::new(move |outcome| {
            let result = invoker.resume_after_rebuild(&request, outcome);
            // A fire-and-forget caller may have dropped the receiver.
            let _ = sender.send(result);
        }));
        self.build.request_rebuild(true);

        PendingInvocation { receiver }
    }

    /// Second and final resolution attempt, entered from the completion
    /// listener. Failing here never schedules another rebuild.
    fn resume_after_rebuild(
        &self,
        request: &InvocationRequest,
        outcome: RebuildOutcome,
    ) -> Result<LaunchReport> {
        let result = match outcome {
            RebuildOutcome::Cancelled => Err(InvocationError::RebuildCancelled.into()),
            RebuildOutcome::Completed => {
                debug!("rebuild finished; retrying base configuration lookup");
                if self.store.find(&self.base_name).is_some() {
                    self.run_resolved(request)
                } else {
                    Err(InvocationError::ConfigurationNotFound {
                        name: self.base_name.clone(),
                    }
                    .into())
                }
            }
        };
        if let Err(err) = &result {
            self.console.error(&format!("{err:#}"));
        }
        result
    }
}
