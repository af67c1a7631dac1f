//! Dependency rebuilds driven by an external command.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::collab::{BuildSystem, RebuildListener, RebuildOutcome};
use crate::infra::config::Settings;

/// Runs the configured rebuild command and fans completion out to one-shot
/// listeners.
///
/// Listeners are drained atomically when a rebuild finishes, so each fires
/// exactly once even when several rebuilds overlap. With no command
/// configured a rebuild completes immediately; the retry then runs against
/// whatever the store already holds.
pub struct CommandBuild {
    inner: Arc<BuildInner>,
}

struct BuildInner {
    argv: Vec<String>,
    working_dir: Option<PathBuf>,
    listeners: Mutex<Vec<RebuildListener>>,
}

impl CommandBuild {
    pub fn from_config(settings: &Settings) -> Result<Self> {
        let argv = shell_words::split(&settings.build.rebuild_command).with_context(|| {
            format!(
                "invalid rebuild command '{}'",
                settings.build.rebuild_command
            )
        })?;
        Ok(Self {
            inner: Arc::new(BuildInner {
                argv,
                working_dir: settings.build.working_dir.clone(),
                listeners: Mutex::new(Vec::new()),
            }),
        })
    }
}

impl BuildSystem for CommandBuild {
    fn subscribe(&self, listener: RebuildListener) {
        self.inner.listeners.lock().push(listener);
    }

    fn request_rebuild(&self, force: bool) {
        debug!(force, command = ?self.inner.argv, "dependency rebuild requested");
        let inner = self.inner.clone();
        thread::spawn(move || {
            let outcome = run_command(&inner.argv, inner.working_dir.as_deref());
            let drained: Vec<RebuildListener> = std::mem::take(&mut *inner.listeners.lock());
            for listener in drained {
                listener(outcome);
            }
        });
    }
}

/// A command that runs to completion counts as a finished rebuild whatever
/// its exit code; only a missing binary or a signal death counts as
/// cancellation.
fn run_command(argv: &[String], working_dir: Option<&Path>) -> RebuildOutcome {
    let Some((program, args)) = argv.split_first() else {
        debug!("no rebuild command configured; treating the rebuild as complete");
        return RebuildOutcome::Completed;
    };

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    match command.status() {
        Ok(status) if status.code().is_some() => {
            debug!(%status, "rebuild command finished");
            RebuildOutcome::Completed
        }
        Ok(status) => {
            warn!(%status, "rebuild command was killed");
            RebuildOutcome::Cancelled
        }
        Err(err) => {
            warn!(error = %err, program = %program, "failed to start the rebuild command");
            RebuildOutcome::Cancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    fn build_for(command: &str) -> CommandBuild {
        let mut settings = Settings::default();
        settings.build.rebuild_command = command.to_string();
        CommandBuild::from_config(&settings).unwrap()
    }

    fn wait_for_outcome(receiver: &mpsc::Receiver<RebuildOutcome>) -> RebuildOutcome {
        receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("rebuild listener never fired")
    }

    #[test]
    fn empty_command_completes_immediately() {
        let build = build_for("");
        let (sender, receiver) = mpsc::channel();
        build.subscribe(Box::new(move |outcome| {
            sender.send(outcome).unwrap();
        }));
        build.request_rebuild(true);
        assert_eq!(wait_for_outcome(&receiver), RebuildOutcome::Completed);
    }

    #[test]
    fn every_listener_fires_exactly_once() {
        let build = build_for("");
        let (sender, receiver) = mpsc::channel();
        for _ in 0..3 {
            let sender = sender.clone();
            build.subscribe(Box::new(move |outcome| {
                sender.send(outcome).unwrap();
            }));
        }
        build.request_rebuild(true);

        for _ in 0..3 {
            assert_eq!(wait_for_outcome(&receiver), RebuildOutcome::Completed);
        }
        drop(sender);
        assert!(receiver.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn unstartable_command_cancels() {
        let build = build_for("/nonexistent/casectl-rebuild-helper");
        let (sender, receiver) = mpsc::channel();
        build.subscribe(Box::new(move |outcome| {
            sender.send(outcome).unwrap();
        }));
        build.request_rebuild(true);
        assert_eq!(wait_for_outcome(&receiver), RebuildOutcome::Cancelled);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_still_counts_as_completed() {
        let build = build_for("sh -c 'exit 3'");
        let (sender, receiver) = mpsc::channel();
        build.subscribe(Box::new(move |outcome| {
            sender.send(outcome).unwrap();
        }));
        build.request_rebuild(true);
        assert_eq!(wait_for_outcome(&receiver), RebuildOutcome::Completed);
    }

    #[test]
    fn unbalanced_quotes_are_rejected_up_front() {
        let mut settings = Settings::default();
        settings.build.rebuild_command = "cmake --build 'build".to_string();
        assert!(CommandBuild::from_config(&settings).is_err());
    }
}
