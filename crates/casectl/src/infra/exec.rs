//! Launching run configurations as local processes.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::domain::collab::ExecutionHost;
use crate::domain::model::{LaunchReport, RunConfiguration};
use crate::infra::config::Settings;

/// Runs configurations as child processes.
///
/// Stdio is inherited so the runner's own output lands directly in the
/// user's terminal; the report only carries the exit status.
pub struct ProcessHost {
    debugger: Vec<String>,
}

impl ProcessHost {
    pub fn from_config(settings: &Settings) -> Result<Self> {
        let debugger = shell_words::split(&settings.runner.debugger)
            .with_context(|| format!("invalid debugger command '{}'", settings.runner.debugger))?;
        Ok(Self { debugger })
    }

    fn run(&self, configuration: &RunConfiguration, debug: bool) -> Result<LaunchReport> {
        let argv = self.argv(configuration, debug)?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("nothing to launch; the debugger command is empty"))?;

        debug!(program = %program, ?args, "launching");
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to start '{program}'"))?;

        Ok(LaunchReport {
            configuration: configuration.name.clone(),
            debug,
            exit_code: status.code(),
        })
    }

    /// Full command line: the debugger prefix (for debug runs), the
    /// executable, then the configuration's argument string split into
    /// words.
    fn argv(&self, configuration: &RunConfiguration, debug: bool) -> Result<Vec<String>> {
        let executable = configuration
            .target
            .executable
            .to_str()
            .ok_or_else(|| {
                anyhow!(
                    "executable path is not valid UTF-8: {}",
                    configuration.target.executable.display()
                )
            })?
            .to_owned();

        let mut argv = Vec::new();
        if debug {
            argv.extend(self.debugger.iter().cloned());
        }
        argv.push(executable);
        argv.extend(shell_words::split(&configuration.program_args).with_context(|| {
            format!(
                "invalid program arguments '{}'",
                configuration.program_args
            )
        })?);
        Ok(argv)
    }
}

impl ExecutionHost for ProcessHost {
    fn execute(&self, configuration: &RunConfiguration) -> Result<LaunchReport> {
        self.run(configuration, false)
    }

    fn debug(&self, configuration: &RunConfiguration) -> Result<LaunchReport> {
        self.run(configuration, true)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::model::InvocationTarget;

    fn host() -> ProcessHost {
        ProcessHost::from_config(&Settings::default()).unwrap()
    }

    fn configuration(executable: &str, args: &str) -> RunConfiguration {
        RunConfiguration {
            name: "systest-case".to_string(),
            target: InvocationTarget {
                build_target: "systest".to_string(),
                profile: None,
                executable: PathBuf::from(executable),
            },
            program_args: args.to_string(),
        }
    }

    #[test]
    fn argv_places_the_selector_after_the_executable() {
        let argv = host()
            .argv(&configuration("/build/systest", "-t /ws/demo.test:02"), false)
            .unwrap();
        assert_eq!(argv, vec!["/build/systest", "-t", "/ws/demo.test:02"]);
    }

    #[test]
    fn debug_argv_is_prefixed_with_the_debugger() {
        let argv = host()
            .argv(&configuration("/build/systest", "-t /ws/demo.test"), true)
            .unwrap();
        assert_eq!(
            argv,
            vec!["gdb", "--args", "/build/systest", "-t", "/ws/demo.test"]
        );
    }

    #[test]
    fn quoted_arguments_stay_single_words() {
        let argv = host()
            .argv(
                &configuration("/build/systest", r#"-t "/ws/with space.test""#),
                false,
            )
            .unwrap();
        assert_eq!(argv, vec!["/build/systest", "-t", "/ws/with space.test"]);
    }

    #[cfg(unix)]
    #[test]
    fn execute_reports_the_exit_code() {
        let report = host()
            .execute(&configuration("/bin/sh", "-c 'exit 7'"))
            .unwrap();
        assert_eq!(report.exit_code, Some(7));
        assert!(!report.debug);
    }

    #[test]
    fn missing_executable_is_a_start_failure() {
        let err = host()
            .execute(&configuration("/nonexistent/casectl-runner", ""))
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to start"));
    }
}
