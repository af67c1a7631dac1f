//! Terminal implementation of the pipeline's diagnostic surface.

use crate::domain::collab::Console;

/// Writes diagnostics to stderr, keeping stdout free for the runner's own
/// output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrConsole;

impl Console for StderrConsole {
    fn info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}
