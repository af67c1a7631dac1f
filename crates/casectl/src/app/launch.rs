//! Dispatching the derived configuration for execution.

use std::sync::Arc;

use anyhow::Result;

use crate::domain::collab::{Console, ExecutionHost};
use crate::domain::errors::InvocationError;
use crate::domain::model::{LaunchReport, RunConfiguration};

/// Hands a configuration to the execution host and reports the outcome.
#[derive(Clone)]
pub struct Launcher {
    host: Arc<dyn ExecutionHost>,
    console: Arc<dyn Console>,
}

impl Launcher {
    pub fn new(host: Arc<dyn ExecutionHost>, console: Arc<dyn Console>) -> Self {
        Self { host, console }
    }

    /// Dispatch `configuration` for normal or debug execution.
    ///
    /// Host failures come back as [`InvocationError::LaunchFailure`] with the
    /// host's diagnostic preserved verbatim.
    pub fn launch(&self, configuration: &RunConfiguration, debug: bool) -> Result<LaunchReport> {
        let mode = if debug { "debug" } else { "run" };
        self.console.info(&format!(
            "{mode} '{}': {} {}",
            configuration.name,
            configuration.target.executable.display(),
            configuration.program_args
        ));

        let dispatched = if debug {
            self.host.debug(configuration)
        } else {
            self.host.execute(configuration)
        };

        match dispatched {
            Ok(report) => {
                if let Some(code) = report.exit_code {
                    self.console.info(&format!(
                        "'{}' exited with code {code}",
                        configuration.name
                    ));
                }
                Ok(report)
            }
            Err(err) => Err(InvocationError::LaunchFailure(format!("{err:#}")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use parking_lot::Mutex;

    use super::*;
    use crate::domain::model::InvocationTarget;

    #[derive(Default)]
    struct NullConsole;

    impl Console for NullConsole {
        fn info(&self, _message: &str) {}
        fn error(&self, _message: &str) {}
    }

    struct FailingHost;

    impl ExecutionHost for FailingHost {
        fn execute(&self, _configuration: &RunConfiguration) -> Result<LaunchReport> {
            Err(anyhow!("debugger backend is not installed"))
        }

        fn debug(&self, configuration: &RunConfiguration) -> Result<LaunchReport> {
            self.execute(configuration)
        }
    }

    #[derive(Default)]
    struct ModeRecordingHost {
        modes: Mutex<Vec<bool>>,
    }

    impl ExecutionHost for ModeRecordingHost {
        fn execute(&self, configuration: &RunConfiguration) -> Result<LaunchReport> {
            self.modes.lock().push(false);
            Ok(LaunchReport {
                configuration: configuration.name.clone(),
                debug: false,
                exit_code: Some(0),
            })
        }

        fn debug(&self, configuration: &RunConfiguration) -> Result<LaunchReport> {
            self.modes.lock().push(true);
            Ok(LaunchReport {
                configuration: configuration.name.clone(),
                debug: true,
                exit_code: Some(0),
            })
        }
    }

    fn configuration() -> RunConfiguration {
        RunConfiguration {
            name: "systest-case".to_string(),
            target: InvocationTarget {
                build_target: "systest".to_string(),
                profile: None,
                executable: "/build/systest".into(),
            },
            program_args: "-t /ws/demo.test:01".to_string(),
        }
    }

    #[test]
    fn debug_flag_selects_the_debug_entry_point() {
        let host = Arc::new(ModeRecordingHost::default());
        let launcher = Launcher::new(host.clone(), Arc::new(NullConsole));

        launcher.launch(&configuration(), false).unwrap();
        launcher.launch(&configuration(), true).unwrap();

        assert_eq!(*host.modes.lock(), vec![false, true]);
    }

    #[test]
    fn host_failures_keep_their_diagnostic() {
        let launcher = Launcher::new(Arc::new(FailingHost), Arc::new(NullConsole));
        let err = launcher.launch(&configuration(), true).unwrap_err();
        let invocation = err.downcast_ref::<InvocationError>().unwrap();
        match invocation {
            InvocationError::LaunchFailure(detail) => {
                assert!(detail.contains("debugger backend is not installed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
